//! `spc run` command - Process one week for every configured feature

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::output::print_panel;
use crate::cli::viz;
use crate::core::config::{HistoryStrategy, RunConfig};
use crate::core::runner::{FeatureOutcome, RunSettings, Runner};
use crate::core::week::WeekRange;

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Week folder to process (YYYYMMDD-YYYYMMDD)
    #[arg(long, short = 'w')]
    pub week: WeekRange,

    /// YAML configuration listing products and features
    #[arg(long, short = 'c', env = "SPC_CONFIG", default_value = "spc_config.yaml")]
    pub config: PathBuf,

    /// Override the data root from the configuration
    #[arg(long)]
    pub data_root: Option<PathBuf>,

    /// Override the result root from the configuration
    #[arg(long)]
    pub result_root: Option<PathBuf>,

    /// Override the minimum number of points per chart
    #[arg(long, short = 't')]
    pub threshold: Option<usize>,

    /// Override how much history is pulled for short weeks
    #[arg(long, value_parser = ["all", "fill_to_threshold"])]
    pub history_strategy: Option<String>,

    /// Also draw each chart in the terminal
    #[arg(long)]
    pub preview: bool,
}

#[derive(Debug, Default)]
struct Totals {
    charted: usize,
    deferred: usize,
    no_data: usize,
    errors: usize,
}

/// Run the weekly batch
pub fn run(args: RunArgs) -> Result<()> {
    let mut config = RunConfig::load(&args.config)?;
    if let Some(root) = args.data_root {
        config.data_root = root;
    }
    if let Some(root) = args.result_root {
        config.result_root = root;
    }
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(strategy) = args.history_strategy.as_deref() {
        config.history_strategy = HistoryStrategy::from(strategy);
    }
    config.validate()?;

    if !config.has_products() {
        println!("[YAML] No products found in config. Please provide a valid YAML.");
        return Ok(());
    }

    tracing::info!(
        week = %args.week,
        threshold = config.threshold,
        strategy = %config.history_strategy,
        "Starting weekly run"
    );

    let mut runner = Runner::new(&config.store_paths(), RunSettings::from(&config));
    let mut totals = Totals::default();

    for product in &config.products {
        let name = product.name();
        let data_dir = config.data_dir(product, &args.week);
        let results_dir = config.results_dir(product, &args.week);

        println!();
        println!(
            "{}",
            style(format!("===== RUNNING PRODUCT: {} =====", name)).bold()
        );

        for feature in &product.features {
            let Some(display_name) = feature.display_name() else {
                eprintln!(
                    "{} Skipping feature with neither display_name nor file_stem in '{}'",
                    style("!").yellow(),
                    name
                );
                totals.errors += 1;
                continue;
            };

            match runner.run_feature(name, feature, &args.week, &data_dir, &results_dir) {
                Ok(FeatureOutcome::NoData { .. }) => {
                    println!("no data points in the {}", display_name);
                    totals.no_data += 1;
                }
                Ok(FeatureOutcome::Deferred(progress)) => {
                    println!("{}", progress);
                    totals.deferred += 1;
                }
                Ok(FeatureOutcome::Charted(report)) => {
                    println!();
                    print_panel(&report.panel);
                    println!(
                        "{} Chart saved to {}",
                        style("✓").green(),
                        style(report.chart_path.display()).cyan()
                    );
                    if args.preview {
                        println!();
                        println!(
                            "{}",
                            viz::render_preview(&report.series.values, &report.limits, &report.ooc)
                        );
                    }
                    totals.charted += 1;
                }
                Err(e) if e.is_fatal() => {
                    return Err(miette::miette!("{}", e));
                }
                Err(e) => {
                    eprintln!("{} {}: {}", style("✗").red(), display_name, e);
                    totals.errors += 1;
                }
            }
        }
    }

    println!();
    println!(
        "{} {} charted, {} accumulating, {} without data, {} error(s)",
        style("Done:").bold(),
        style(totals.charted).green(),
        totals.deferred,
        totals.no_data,
        totals.errors
    );

    Ok(())
}
