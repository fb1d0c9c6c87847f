//! Pupline CLI - batch driver for turning raw listing photos into web-ready
//! derivatives.
//!
//! Raw photos live one folder per animal (`raw-images/spitz-branco-macho/`).
//! Pupline checks their quality, renders cropped and color-corrected WebP and
//! JPEG derivatives at every configured size, and can publish them to object
//! storage.
//!
//! # Usage
//!
//! ```bash
//! # Process everything under the configured input root
//! pupline process
//!
//! # Process a different root, uploading the results
//! pupline process ./shoot-2024-06 --upload
//!
//! # Check photos before a shoot is processed
//! pupline analyze ./raw-images/spitz-branco-macho/*.jpg
//!
//! # View configuration
//! pupline config show
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use pupline_core::Policy;
use std::path::{Path, PathBuf};

mod cli;
mod logging;

/// Pupline - image pipeline for animal listing photos.
#[derive(Parser, Debug)]
#[command(name = "pupline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "PUPLINE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Render derivatives for every image under the input root
    Process(cli::process::ProcessArgs),

    /// Run the quality analyzer on individual images
    Analyze(cli::analyze::AnalyzeArgs),

    /// Remove every derivative of one item
    Clean(cli::clean::CleanArgs),

    /// Inspect the object storage backend
    Storage(cli::storage::StorageArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

fn load_policy(path: Option<&Path>) -> Result<Policy, pupline_core::ConfigError> {
    match path {
        Some(path) => Policy::load_from(path),
        None => Policy::load(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = load_policy(cli.config.as_deref());
    match &loaded {
        Ok(policy) => logging::init_from_config(policy, cli.verbose, cli.json_logs),
        Err(_) => logging::init(cli.verbose, cli.json_logs),
    }

    tracing::debug!("Pupline v{}", pupline_core::VERSION);

    let config_path = cli.config;

    // Dispatch to the appropriate command handler. `config` must work even
    // when the current file is broken.
    match cli.command {
        Commands::Config(args) => cli::config::execute(args, config_path.as_deref(), loaded).await,
        Commands::Process(args) => {
            cli::process::execute(args, require(loaded, config_path.as_deref())?).await
        }
        Commands::Analyze(args) => {
            cli::analyze::execute(args, require(loaded, config_path.as_deref())?).await
        }
        Commands::Clean(args) => {
            cli::clean::execute(args, require(loaded, config_path.as_deref())?).await
        }
        Commands::Storage(args) => {
            cli::storage::execute(args, require(loaded, config_path.as_deref())?).await
        }
    }
}

fn require(
    loaded: Result<Policy, pupline_core::ConfigError>,
    path: Option<&Path>,
) -> anyhow::Result<Policy> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(Policy::default_path);
    loaded.with_context(|| {
        format!(
            "Failed to load configuration from {}\n  \
             Hint: run `pupline config init --force` to write a fresh default config.",
            path.display()
        )
    })
}
