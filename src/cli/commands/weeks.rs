//! `spc weeks` command - Show a week range and the ranges before it

use console::style;
use miette::Result;

use crate::core::week::WeekRange;

#[derive(clap::Args, Debug)]
pub struct WeeksArgs {
    /// Week range (YYYYMMDD-YYYYMMDD)
    pub week: WeekRange,
}

pub fn run(args: WeeksArgs) -> Result<()> {
    let week = args.week;
    println!(
        "{} {}  ({} → {})",
        style("Week:").bold(),
        style(week).cyan(),
        week.start().format("%Y-%m-%d"),
        week.end().format("%Y-%m-%d")
    );
    for (i, prev) in week.preceding().iter().enumerate() {
        println!("  -{}: {}", i + 1, prev);
    }
    Ok(())
}
