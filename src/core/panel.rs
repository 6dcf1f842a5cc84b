//! Summary panel shown next to the chart and echoed to the console
//!
//! Each line carries a [`LineKind`] so renderers pick colors without
//! inspecting the text.

use crate::core::accumulate::ReadySeries;
use crate::core::limits::Limits;
use crate::core::metrics::{sigma_text, Capability};
use crate::core::week::WeekRange;

/// Semantic category of a panel line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Plain,
    /// Sigma level and risk
    Emphasis,
    /// Previous sigma for comparison
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLine {
    pub kind: LineKind,
    pub text: String,
}

impl PanelLine {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Plain,
            text: text.into(),
        }
    }

    fn emphasis(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Emphasis,
            text: text.into(),
        }
    }

    fn info(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Info,
            text: text.into(),
        }
    }
}

/// Everything the panel reports for one chart
pub struct PanelInput<'a> {
    pub feature: &'a str,
    pub week: &'a WeekRange,
    pub capability: &'a Capability,
    pub limits: &'a Limits,
    pub series: &'a ReadySeries,
    pub last_sigma: Option<f64>,
    pub ooc: &'a [usize],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryPanel {
    pub lines: Vec<PanelLine>,
}

impl SummaryPanel {
    pub fn build(input: &PanelInput<'_>) -> Self {
        let cap = input.capability;
        let l = input.limits;

        let mut lines = vec![
            PanelLine::plain(format!("--- {} (I-MR SPC) ---", input.feature)),
            PanelLine::plain(format!("Mean: {:.3} | Std Dev: {:.3}", cap.mean, cap.std_dev)),
            PanelLine::plain(format!("USL: {:.3} | LSL: {:.3}", l.usl, l.lsl)),
            PanelLine::plain(format!("UCL: {:.3} | LCL: {:.3}", l.ucl, l.lcl)),
        ];
        if let Some(action) = l.action {
            lines.push(PanelLine::plain(format!(
                "UAL: {:.3} | LAL: {:.3}",
                action.ual, action.lal
            )));
        }
        lines.extend([
            PanelLine::plain(format!("Cp: {:.3} | Cpk: {:.3}", cap.cp, cap.cpk)),
            PanelLine::emphasis(format!(
                "Sigma Level (≈ Cpk × 3): {}",
                level_text(cap.sigma_level)
            )),
            PanelLine::emphasis(format!("Risk Level: {}", cap.risk)),
            PanelLine::info(format!("Last Sigma Level: {}", sigma_text(input.last_sigma))),
            PanelLine::plain(source_note(input.series, input.week)),
            PanelLine::plain(format!("OOC points: {}", ooc_text(input.ooc))),
        ]);

        Self { lines }
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.text.as_str())
    }
}

/// Provenance line: how many points came from memory and from this week
pub fn source_note(series: &ReadySeries, week: &WeekRange) -> String {
    let weeks = &series.history.weeks;
    match (weeks.first(), weeks.last()) {
        (Some(first), Some(last)) => {
            let range = if first == last {
                first.clone()
            } else {
                format!("{} … {}", first, last)
            };
            format!(
                "Data source: memory({}) from {} | current({}) from {}",
                series.history.len(),
                range,
                series.current_count,
                week
            )
        }
        _ => format!(
            "Data source: current({}) from {}",
            series.current_count, week
        ),
    }
}

/// Whole numbers keep one decimal ("4.0"), others print as rounded
fn level_text(level: f64) -> String {
    if level.is_finite() && level.fract() == 0.0 {
        format!("{:.1}", level)
    } else {
        level.to_string()
    }
}

fn ooc_text(ooc: &[usize]) -> String {
    if ooc.is_empty() {
        return "None".to_string();
    }
    let ids: Vec<String> = ooc.iter().map(|i| i.to_string()).collect();
    format!("[{}]", ids.join(", "))
}
