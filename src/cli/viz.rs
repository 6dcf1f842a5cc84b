//! Terminal preview of a control chart using braille graphics
//!
//! Used by `spc run --preview` to eyeball a chart without opening the SVG.

use drawille::Canvas;

use crate::core::limits::Limits;

/// Default canvas size for the individuals chart
pub const CHART_WIDTH: u32 = 120;
pub const CHART_HEIGHT: u32 = 40;

/// Render the series as a braille line chart with UCL/LCL guides
///
/// Out-of-control points (1-based indices in `ooc`) get a small `x` marker.
///
/// # Example Output
/// ```text
/// ⠉⠉⠉⠉⠉⠉⠉⠉⠉⠉⠉⠉⠉⠉⠉⠉  UCL
/// ⠀⠀⢀⠔⠢⡀⠀⠀⡠⠊⠑⢄⠀⠀⠀⠀
/// ⣀⣀⣀⣀⣀⣀⣀⣀⣀⣀⣀⣀⣀⣀⣀⣀  LCL
/// ```
pub fn render_control_chart(values: &[f64], limits: &Limits, ooc: &[usize]) -> String {
    if values.is_empty() {
        return "  (no points)".to_string();
    }

    let lo = values
        .iter()
        .copied()
        .chain([limits.lcl])
        .fold(f64::INFINITY, f64::min);
    let hi = values
        .iter()
        .copied()
        .chain([limits.ucl])
        .fold(f64::NEG_INFINITY, f64::max);
    let span = (hi - lo).max(1e-9);

    let max_x = CHART_WIDTH - 1;
    let max_y = CHART_HEIGHT - 1;
    let to_x = |i: usize| -> u32 {
        if values.len() == 1 {
            0
        } else {
            (i as f64 / (values.len() - 1) as f64 * max_x as f64).round() as u32
        }
    };
    // Y inverted
    let to_y = |v: f64| -> u32 { ((hi - v) / span * max_y as f64).round().clamp(0.0, max_y as f64) as u32 };

    let mut canvas = Canvas::new(CHART_WIDTH, CHART_HEIGHT);

    // Dotted control limits
    for x in (0..CHART_WIDTH).step_by(3) {
        canvas.set(x, to_y(limits.ucl));
        canvas.set(x, to_y(limits.lcl));
    }

    for i in 1..values.len() {
        canvas.line(to_x(i - 1), to_y(values[i - 1]), to_x(i), to_y(values[i]));
    }
    if values.len() == 1 {
        canvas.set(0, to_y(values[0]));
    }

    for &idx in ooc {
        let Some(&v) = idx.checked_sub(1).and_then(|i| values.get(i)) else {
            continue;
        };
        mark_point(&mut canvas, to_x(idx - 1), to_y(v), max_x, max_y);
    }

    let mut output = String::new();
    output.push_str(&format!("I chart ({} points):\n", values.len()));
    output.push_str(&canvas.frame());
    output.push_str(&format!(
        "\n  UCL={:.3}  LCL={:.3}  OOC={}",
        limits.ucl,
        limits.lcl,
        ooc.len()
    ));
    output
}

fn mark_point(canvas: &mut Canvas, x: u32, y: u32, max_x: u32, max_y: u32) {
    let (left, right) = (x.saturating_sub(1), (x + 1).min(max_x));
    let (up, down) = (y.saturating_sub(1), (y + 1).min(max_y));
    for (px, py) in [(left, up), (right, up), (x, y), (left, down), (right, down)] {
        canvas.set(px, py);
    }
}

/// Render the observed spread against the specification limits
///
/// Shows min/max range with spec limits
pub fn render_spec_bar(min: f64, max: f64, lsl: f64, usl: f64) -> String {
    let bar_width = 60;

    let full_range = (usl - lsl).abs().max(1e-9);
    let margin = full_range * 0.1;
    let view_min = lsl.min(min) - margin;
    let view_max = usl.max(max) + margin;
    let view_range = view_max - view_min;

    let pos = |v: f64| -> usize {
        (((v - view_min) / view_range * bar_width as f64) as usize).min(bar_width - 1)
    };
    let (pos_lsl, pos_usl, pos_min, pos_max) = (pos(lsl), pos(usl), pos(min), pos(max));

    let mut bar: Vec<char> = vec!['─'; bar_width];
    bar[pos_lsl] = '│';
    bar[pos_usl] = '│';

    for cell in bar.iter_mut().take(pos_max + 1).skip(pos_min) {
        *cell = if *cell == '│' { '╋' } else { '═' };
    }
    bar[pos_min] = if bar[pos_min] == '╋' { '╟' } else { '[' };
    bar[pos_max] = if bar[pos_max] == '╋' { '╢' } else { ']' };

    let bar_str: String = bar.into_iter().collect();

    format!(
        "  LSL={:.3}  USL={:.3}\n  {}\n  Min={:.4}  Max={:.4}",
        lsl, usl, bar_str, min, max
    )
}

/// Chart plus spec bar for one series
pub fn render_preview(values: &[f64], limits: &Limits, ooc: &[usize]) -> String {
    let mut out = vec![render_control_chart(values, limits, ooc)];
    if let (Some(min), Some(max)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) {
        out.push(String::new());
        out.push(render_spec_bar(min, max, limits.lsl, limits.usl));
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> Limits {
        Limits {
            usl: 1.5,
            lsl: 0.5,
            ucl: 1.3,
            lcl: 0.7,
            action: None,
        }
    }

    #[test]
    fn test_render_control_chart_has_braille() {
        let output = render_control_chart(&[1.0, 1.1, 0.9, 1.4, 1.0], &limits(), &[4]);

        assert!(output.contains("I chart (5 points)"));
        assert!(output.contains("UCL=1.300"));
        assert!(output.contains("OOC=1"));
        assert!(output
            .chars()
            .any(|c| c as u32 >= 0x2800 && c as u32 <= 0x28FF));
    }

    #[test]
    fn test_render_control_chart_marks_ooc_points() {
        let flat = [1.0; 5];
        let frame = |ooc: &[usize]| {
            let output = render_control_chart(&flat, &limits(), ooc);
            output
                .split("\n  UCL=")
                .next()
                .unwrap_or_default()
                .to_string()
        };

        assert_ne!(frame(&[3]), frame(&[]));
        // Indices past the series are ignored
        assert_eq!(frame(&[0, 9]), frame(&[]));
    }

    #[test]
    fn test_render_control_chart_empty_and_single() {
        assert!(render_control_chart(&[], &limits(), &[]).contains("no points"));
        assert!(render_control_chart(&[1.0], &limits(), &[]).contains("I chart (1 points)"));
    }

    #[test]
    fn test_render_spec_bar() {
        let output = render_spec_bar(0.8, 1.2, 0.5, 1.5);

        assert!(output.contains("LSL=0.500"));
        assert!(output.contains("USL=1.500"));
        assert!(output.contains("Min=0.8000"));
        assert!(output.contains("Max=1.2000"));
        assert!(output.contains('['));
        assert!(output.contains(']'));
    }

    #[test]
    fn test_render_spec_bar_outside_limits() {
        // Spread wider than the spec band must not panic
        let output = render_spec_bar(-5.0, 9.0, 0.5, 1.5);
        assert!(output.contains("Min=-5.0000"));
    }

    #[test]
    fn test_render_preview_combines_sections() {
        let output = render_preview(&[1.0, 1.2], &limits(), &[]);
        assert!(output.contains("I chart"));
        assert!(output.contains("LSL=0.500"));
    }
}
