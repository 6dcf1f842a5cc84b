use clap::Parser;
use miette::Result;
use spc::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info,spc=debug",
        _ => "debug,spc=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match cli.command {
        Commands::Run(args) => spc::cli::commands::run::run(args),
        Commands::Memory(cmd) => spc::cli::commands::memory::run(cmd, &cli.global),
        Commands::Sigma(cmd) => spc::cli::commands::sigma::run(cmd, &cli.global),
        Commands::Weeks(args) => spc::cli::commands::weeks::run(args),
        Commands::Completions(args) => spc::cli::commands::completions::run(args),
    }
}
