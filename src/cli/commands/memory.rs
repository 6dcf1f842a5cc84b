//! `spc memory` command - Inspect and clear accumulated observations

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{settings::Style, Table, Tabled};

use crate::cli::helpers::{split_key, truncate_str, StoreArgs};
use crate::cli::output::effective_format;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::memory::{MemoryStore, Observation, SeriesKey};

#[derive(Subcommand, Debug)]
pub enum MemoryCommands {
    /// List accumulated series with their point counts and weeks
    Show(ShowArgs),

    /// Drop every accumulated point for one series
    Clear(ClearArgs),
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Only show series of this product
    #[arg(long, short = 'p')]
    pub product: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ClearArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Product name as configured
    #[arg(long, short = 'p')]
    pub product: String,

    /// Feature display name as configured
    #[arg(long, short = 'f')]
    pub feature: String,
}

#[derive(Tabled, serde::Serialize)]
struct BucketRow {
    #[tabled(rename = "PRODUCT")]
    product: String,
    #[tabled(rename = "FEATURE")]
    feature: String,
    #[tabled(rename = "POINTS")]
    points: usize,
    #[tabled(rename = "WEEKS")]
    weeks: String,
}

pub fn run(cmd: MemoryCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        MemoryCommands::Show(args) => run_show(args, global),
        MemoryCommands::Clear(args) => run_clear(args),
    }
}

fn distinct_weeks(records: &[Observation]) -> Vec<&str> {
    let mut weeks: Vec<&str> = records.iter().map(|r| r.week.as_str()).collect();
    weeks.dedup();
    weeks
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let paths = args.store.store_paths()?;
    let store = MemoryStore::open(&paths.memory);

    let rows: Vec<BucketRow> = store
        .iter()
        .filter(|(key, _)| {
            args.product
                .as_deref()
                .map_or(true, |p| split_key(key).0 == p)
        })
        .map(|(key, records)| {
            let (product, feature) = split_key(key);
            BucketRow {
                product: product.to_string(),
                feature: feature.to_string(),
                points: records.len(),
                weeks: distinct_weeks(records).join(", "),
            }
        })
        .collect();

    match effective_format(global.output) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows).into_diagnostic()?);
        }
        OutputFormat::Tsv => {
            for row in &rows {
                println!("{}\t{}\t{}\t{}", row.product, row.feature, row.points, row.weeks);
            }
        }
        _ => {
            if rows.is_empty() {
                println!("No accumulated points in {}", paths.memory.display());
                return Ok(());
            }
            let display: Vec<BucketRow> = rows
                .into_iter()
                .map(|r| BucketRow {
                    weeks: truncate_str(&r.weeks, 60),
                    ..r
                })
                .collect();
            println!("{}", Table::new(display).with(Style::rounded()));
        }
    }
    Ok(())
}

fn run_clear(args: ClearArgs) -> Result<()> {
    let paths = args.store.store_paths()?;
    let mut store = MemoryStore::open(&paths.memory);
    let key = SeriesKey::new(&args.product, &args.feature);

    if store.clear(&key).into_diagnostic()? {
        println!("{} Cleared memory for '{}'", style("✓").green(), key);
    } else {
        println!("Nothing stored for '{}'", key);
    }
    Ok(())
}
