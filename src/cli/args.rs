//! Command-line argument definitions

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    completions::CompletionsArgs, memory::MemoryCommands, run::RunArgs, sigma::SigmaCommands,
    weeks::WeeksArgs,
};

#[derive(Parser, Debug)]
#[command(name = "spc")]
#[command(author, version)]
#[command(about = "Weekly I-MR SPC charts with cross-week accumulation")]
#[command(
    long_about = "Generates weekly individuals (I-MR) control charts from measurement exports.\n\
    Weeks with too few points are remembered and combined with later weeks until the\n\
    sample threshold is met; each chart reports Cp, Cpk, sigma level and risk."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format for listings
    #[arg(long, short = 'o', global = true, default_value = "auto")]
    pub output: OutputFormat,

    /// Verbose logging to stderr (repeat for more)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Table on a terminal
    #[default]
    Auto,
    /// Human-readable table
    Table,
    /// JSON document
    Json,
    /// Tab-separated values
    Tsv,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process one week for every configured product and feature
    Run(RunArgs),

    /// Inspect or clear accumulated observations
    #[command(subcommand)]
    Memory(MemoryCommands),

    /// Inspect last plotted sigma levels
    #[command(subcommand)]
    Sigma(SigmaCommands),

    /// Show a week range and the ranges before it
    Weeks(WeeksArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
