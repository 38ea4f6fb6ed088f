//! InfraLens CLI
//!
//! Analyzes an infrastructure diff and prints the risk report as JSON

use clap::{Parser, Subcommand};
use infralens_core::logging_facility::{init, Profile};
use std::path::PathBuf;

mod commands;
mod error;
mod openai;
mod settings;

use error::CliError;
use settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "infralens")]
#[command(about = "InfraLens - Risk reports for infrastructure diffs", long_about = None)]
struct Cli {
    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyze a diff and print the report
    Analyze(commands::analyze::AnalyzeArgs),
    /// Narrative cache maintenance
    Cache(commands::cache::CacheArgs),
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = Settings::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Analyze(args) => commands::analyze::execute(args, settings),
        Commands::Cache(args) => commands::cache::execute(args, settings),
    }
}

fn main() {
    let cli = Cli::parse();
    init(if cli.json_logs {
        Profile::Production
    } else {
        Profile::Development
    });

    if let Err(e) = run(cli) {
        eprintln!("Error: [{}] {}", e.code(), e);
        std::process::exit(e.exit_code());
    }
}
