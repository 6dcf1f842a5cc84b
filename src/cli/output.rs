//! Output formatting utilities

use console::{style, Color};

use crate::cli::OutputFormat;
use crate::core::panel::{LineKind, SummaryPanel};

/// Determine the effective output format for listings
pub fn effective_format(format: OutputFormat) -> OutputFormat {
    match format {
        OutputFormat::Auto => OutputFormat::Table,
        other => other,
    }
}

/// Console color for a panel line, `None` for plain text
pub fn line_color(kind: LineKind) -> Option<Color> {
    match kind {
        LineKind::Plain => None,
        LineKind::Emphasis => Some(Color::Red),
        LineKind::Info => Some(Color::Blue),
    }
}

/// Echo a summary panel with sigma/risk in red and the previous sigma in blue
pub fn print_panel(panel: &SummaryPanel) {
    for line in &panel.lines {
        match line_color(line.kind) {
            Some(color) => println!("{}", style(&line.text).fg(color).bright()),
            None => println!("{}", line.text),
        }
    }
}
