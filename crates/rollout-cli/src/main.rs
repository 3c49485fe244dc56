//! # rollout CLI entry point
//!
//! Parses command-line arguments, installs logging, and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rollout_cli::schemas::run_schemas;
use rollout_cli::validate::{run_validate, ValidateArgs};
use rollout_schema::PipelineLoader;

/// Rollout pipeline validator.
///
/// Checks pipeline definitions against their versioned schema, then checks
/// resource-group fields, step-name uniqueness, and step dependencies.
#[derive(Parser, Debug)]
#[command(name = "rollout", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory of additional `<reference>.json` schema files.
    #[arg(long, global = true)]
    schema_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate pipeline files.
    Validate(ValidateArgs),

    /// List registered schema references.
    Schemas,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = rollout_cli::load_registry(cli.schema_dir.as_deref()).and_then(|registry| {
        let mut stdout = std::io::stdout().lock();
        match cli.command {
            Commands::Validate(args) => {
                run_validate(&args, &PipelineLoader::new(registry), &mut stdout)
            }
            Commands::Schemas => run_schemas(&registry, &mut stdout),
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
