//! ssm-inject CLI
//!
//! Runs the build-start resolution cycle against a local build assembled from
//! a parameters file and/or the process environment.

mod cli;
mod commands;
mod local_build;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let settings = commands::load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Detect(args) => commands::detect::run(args, &settings),
        Commands::Resolve(args) => commands::resolve::run(args, settings, cli.quiet).await,
        Commands::Exec(args) => commands::exec::run(args, settings, cli.quiet).await,
    }
}

/// Filter directive for the `-v`/`-q` flags
fn default_filter(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = EnvFilter::new(default_filter(verbose, quiet));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
