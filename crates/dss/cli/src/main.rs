//! DSS CLI - command-line interface for environmental-clearance classification
//!
//! - `dss classify`: classify a project submission (file or stdin)
//! - `dss check`: validate a rule set directory and summarise it
//!
//! Results go to stdout; logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::{check, classify};

/// DSS CLI application
#[derive(Parser)]
#[command(name = "dss")]
#[command(about = "DSS - environmental-clearance category classifier", long_about = None)]
#[command(version)]
struct Cli {
    /// Rule set directory
    #[arg(short, long, env = "DSS_CONFIG", default_value = "config")]
    config: PathBuf,

    /// Output format (json, yaml, table)
    #[arg(short, long, default_value = "json")]
    output: output::OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Classify a project submission
    Classify(classify::ClassifyArgs),

    /// Validate the rule set and print a summary
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Classify(args) => classify::execute(args, &cli.config, cli.output).await,
        Commands::Check => check::execute(&cli.config, cli.output),
    }
}
