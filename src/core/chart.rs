//! SVG rendering of the I-MR individuals chart with its summary panel
//!
//! Layout mirrors a 14x6 figure split 3:2 between the plot and the text panel.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::limits::Limits;
use crate::core::panel::{LineKind, SummaryPanel};

const WIDTH: f64 = 1400.0;
const HEIGHT: f64 = 600.0;
const PLOT_WIDTH: f64 = WIDTH * 3.0 / 5.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;

/// Everything needed to draw one chart
pub struct ChartSpec<'a> {
    pub feature: &'a str,
    pub y_label: &'a str,
    pub values: &'a [f64],
    pub mean: f64,
    pub limits: &'a Limits,
    /// 1-based out-of-control positions
    pub ooc: &'a [usize],
    pub panel: &'a SummaryPanel,
}

/// X-axis ticks for `n` points and the right edge of the axis
///
/// Step is 1 up to 20 points, 2 up to 50, then 5; the last point always gets a
/// tick and one blank step is left after it.
pub fn x_ticks(n: usize) -> (Vec<usize>, usize) {
    let step = if n <= 20 {
        1
    } else if n <= 50 {
        2
    } else {
        5
    };
    let mut ticks: Vec<usize> = (1..=n).step_by(step).collect();
    match ticks.last() {
        Some(&last) if last != n => ticks.push(n),
        None => ticks.push(n),
        _ => {}
    }
    (ticks, n + step)
}

struct RefLine {
    label: &'static str,
    value: f64,
    color: &'static str,
    dash: &'static str,
}

fn reference_lines(spec: &ChartSpec<'_>) -> Vec<RefLine> {
    let l = spec.limits;
    let mut lines = vec![
        RefLine { label: "Mean", value: spec.mean, color: "green", dash: "6,4" },
        RefLine { label: "UCL", value: l.ucl, color: "red", dash: "8,3,2,3" },
        RefLine { label: "LCL", value: l.lcl, color: "red", dash: "8,3,2,3" },
        RefLine { label: "LSL", value: l.lsl, color: "blue", dash: "6,4" },
        RefLine { label: "USL", value: l.usl, color: "blue", dash: "6,4" },
    ];
    if let Some(action) = l.action {
        lines.push(RefLine { label: "UAL", value: action.ual, color: "darkgoldenrod", dash: "6,4" });
        lines.push(RefLine { label: "LAL", value: action.lal, color: "darkgoldenrod", dash: "6,4" });
    }
    lines
}

fn panel_color(kind: LineKind) -> &'static str {
    match kind {
        LineKind::Plain => "black",
        LineKind::Emphasis => "red",
        LineKind::Info => "blue",
    }
}

/// Render a complete standalone SVG document
pub fn render_svg(spec: &ChartSpec<'_>) -> String {
    let n = spec.values.len();
    let (ticks, x_max) = x_ticks(n);
    let refs = reference_lines(spec);

    let finite = spec
        .values
        .iter()
        .copied()
        .chain(refs.iter().map(|r| r.value))
        .filter(|v| v.is_finite());
    let (mut y_min, mut y_max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = 0.0;
        y_max = 1.0;
    }
    let pad = ((y_max - y_min) * 0.05).max(1e-9);
    y_min -= pad;
    y_max += pad;

    let left = MARGIN_LEFT;
    let right = PLOT_WIDTH - MARGIN_RIGHT;
    let top = MARGIN_TOP;
    let bottom = HEIGHT - MARGIN_BOTTOM;

    let sx = |x: f64| left + (x - 1.0) / ((x_max as f64 - 1.0).max(1.0)) * (right - left);
    let sy = |y: f64| bottom - (y - y_min) / (y_max - y_min) * (bottom - top);

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
        w = WIDTH,
        h = HEIGHT
    );
    let _ = writeln!(svg, r#"<rect width="{}" height="{}" fill="white"/>"#, WIDTH, HEIGHT);

    // Title and axis labels
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="30" font-size="16" text-anchor="middle">{} - I-MR SPC Chart</text>"#,
        (left + right) / 2.0,
        escape(spec.feature)
    );
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" font-size="13" text-anchor="middle">Wafer/Subgroup Number</text>"#,
        (left + right) / 2.0,
        HEIGHT - 15.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="20" y="{y:.1}" font-size="13" text-anchor="middle" transform="rotate(-90 20 {y:.1})">{}</text>"#,
        escape(spec.y_label),
        y = (top + bottom) / 2.0
    );

    // Frame and grid
    let _ = writeln!(
        svg,
        r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="black"/>"#,
        left,
        top,
        right - left,
        bottom - top
    );
    for &t in &ticks {
        let x = sx(t as f64);
        let _ = writeln!(
            svg,
            r##"<line x1="{x:.1}" y1="{top:.1}" x2="{x:.1}" y2="{bottom:.1}" stroke="#000" stroke-opacity="0.1"/>"##
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="11" text-anchor="middle">{}</text>"#,
            x,
            bottom + 16.0,
            t
        );
    }
    for i in 0..=5 {
        let v = y_min + (y_max - y_min) * i as f64 / 5.0;
        let y = sy(v);
        let _ = writeln!(
            svg,
            r##"<line x1="{left:.1}" y1="{y:.1}" x2="{right:.1}" y2="{y:.1}" stroke="#000" stroke-opacity="0.1"/>"##
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end">{:.3}</text>"#,
            left - 6.0,
            y + 4.0,
            v
        );
    }

    // Reference lines
    for r in refs.iter().filter(|r| r.value.is_finite()) {
        let y = sy(r.value);
        let _ = writeln!(
            svg,
            r#"<line x1="{left:.1}" y1="{y:.1}" x2="{right:.1}" y2="{y:.1}" stroke="{}" stroke-dasharray="{}"/>"#,
            r.color,
            r.dash
        );
    }

    // Series line then points, OOC points in red
    if n > 0 {
        let path: Vec<String> = spec
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{:.1},{:.1}", sx((i + 1) as f64), sy(*v)))
            .collect();
        let _ = writeln!(
            svg,
            r#"<polyline points="{}" fill="none" stroke="black" stroke-opacity="0.7" stroke-dasharray="5,4"/>"#,
            path.join(" ")
        );
    }
    for (i, v) in spec.values.iter().enumerate() {
        let color = if spec.ooc.contains(&(i + 1)) { "red" } else { "black" };
        let _ = writeln!(
            svg,
            r#"<circle cx="{:.1}" cy="{:.1}" r="4" fill="{}"/>"#,
            sx((i + 1) as f64),
            sy(*v),
            color
        );
    }

    // Legend
    for (i, r) in refs.iter().enumerate() {
        let y = top + 14.0 + i as f64 * 16.0;
        let x = right - 90.0;
        let _ = writeln!(
            svg,
            r#"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{}" stroke-dasharray="{}"/>"#,
            x,
            x + 24.0,
            r.color,
            r.dash
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="11">{}</text>"#,
            x + 30.0,
            y + 4.0,
            r.label
        );
    }

    // Summary panel
    let mut y = 40.0;
    for line in &spec.panel.lines {
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="13" font-family="monospace" fill="{}">{}</text>"#,
            PLOT_WIDTH + 20.0,
            y,
            panel_color(line.kind),
            escape(&line.text)
        );
        y += 27.0;
    }

    svg.push_str("</svg>\n");
    svg
}

/// Write `<results_dir>/<feature>.svg` and return its path
pub fn write_chart(results_dir: &Path, feature: &str, svg: &str) -> std::io::Result<PathBuf> {
    fs::create_dir_all(results_dir)?;
    let path = results_dir.join(format!("{}.svg", file_name_for(feature)));
    fs::write(&path, svg)?;
    Ok(path)
}

fn file_name_for(feature: &str) -> String {
    feature
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
