//! `spc sigma` command - Show last plotted sigma levels

use clap::Subcommand;
use miette::{IntoDiagnostic, Result};
use tabled::{settings::Style, Table, Tabled};

use crate::cli::helpers::{split_key, StoreArgs};
use crate::cli::output::effective_format;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::metrics::{sigma_text, RiskLevel};
use crate::core::sigma::SigmaCache;

#[derive(Subcommand, Debug)]
pub enum SigmaCommands {
    /// List the sigma level recorded by each series' latest chart
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Tabled, serde::Serialize)]
struct SigmaRow {
    #[tabled(rename = "PRODUCT")]
    product: String,
    #[tabled(rename = "FEATURE")]
    feature: String,
    #[tabled(rename = "SIGMA")]
    sigma: String,
    #[tabled(rename = "RISK")]
    risk: String,
}

pub fn run(cmd: SigmaCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SigmaCommands::Show(args) => run_show(args, global),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let paths = args.store.store_paths()?;
    let cache = SigmaCache::open(&paths.sigma);

    let rows: Vec<SigmaRow> = cache
        .iter()
        .map(|(key, sigma)| {
            let (product, feature) = split_key(key);
            SigmaRow {
                product: product.to_string(),
                feature: feature.to_string(),
                sigma: sigma_text(Some(sigma)),
                risk: RiskLevel::from_sigma(sigma).to_string(),
            }
        })
        .collect();

    match effective_format(global.output) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows).into_diagnostic()?);
        }
        OutputFormat::Tsv => {
            for row in &rows {
                println!("{}\t{}\t{}\t{}", row.product, row.feature, row.sigma, row.risk);
            }
        }
        _ => {
            if rows.is_empty() {
                println!("No sigma levels recorded in {}", paths.sigma.display());
                return Ok(());
            }
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
    }
    Ok(())
}
