//! # staging CLI entry point
//!
//! Parses command-line arguments, opens the staging root and dispatches to
//! subcommand handlers.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use staging_cli::show::{run_show, ShowArgs};
use staging_cli::stages::{run_stages, StagesArgs};
use staging_store::FsStageStore;

/// LDR staging CLI.
///
/// Reads stages, segments, material suites and presforms from a staging
/// root on disk, using the same addressing as the HTTP API.
#[derive(Parser, Debug)]
#[command(name = "staging", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Staging root directory.
    #[arg(long, env = "STAGING_ENV_PATH", global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List stage identifiers.
    Stages(StagesArgs),

    /// Resolve an escaped identifier path and print or write the result.
    Show(ShowArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // Logs go to stderr so item bytes on stdout stay clean.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = require_root(cli.root.as_deref()).and_then(|root| {
        tracing::debug!(root = %root.display(), "opening staging root");
        let store = FsStageStore::new(root);
        let mut stdout = std::io::stdout().lock();
        match &cli.command {
            Commands::Stages(args) => run_stages(args, &store, &mut stdout),
            Commands::Show(args) => run_show(args, &store, &mut stdout),
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

/// The staging root from `--root` or `STAGING_ENV_PATH`.
fn require_root(root: Option<&Path>) -> anyhow::Result<&Path> {
    root.ok_or_else(|| anyhow::anyhow!("no staging root: pass --root <dir> or set STAGING_ENV_PATH"))
}
