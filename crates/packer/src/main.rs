//! # Packer
//!
//! Build the game's release archive.
//!
//! ## Usage
//!
//! ```bash
//! packer all         # Bundle + optimize + archive
//! packer prepare     # Bundle scripts into build/ (no network)
//! packer compile     # Bundle + optimize, write build/bundle.js
//! packer archive     # Archive build/bundle.js with the assets
//! packer status      # Show inputs and artifacts
//! packer clean       # Remove build/
//! packer config      # Print the effective configuration
//! ```
//!
//! ## Configuration
//!
//! Defaults can be overridden by `packer.json` at the project root or by
//! `--config <file>`. Set `RUST_LOG` (or pass `-v`) for diagnostics.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod packer;

use packer::archive::CommandArchiver;
use packer::closure::ClosureService;
use packer::config::{Config, Overrides};
use packer::{PackCommands, Pipeline};

#[derive(Parser)]
#[command(name = "packer", version, about = "Bundle, optimize and archive the game release")]
struct Cli {
    /// Project root that input paths are relative to
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Config file (default: <root>/packer.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the optimizer endpoint URL
    #[arg(long, global = true)]
    service_url: Option<String>,

    /// Override the archiver program
    #[arg(long, global = true)]
    archiver: Option<String>,

    /// Log diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: PackCommands,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let root = cli.root;
    let config = Config::load(&root, cli.config.as_deref())?.with_overrides(Overrides {
        service_url: cli.service_url,
        archiver: cli.archiver,
    });

    match cli.command {
        PackCommands::All => with_pipeline(&root, &config, |p| p.run().map(drop))?,
        PackCommands::Prepare => with_pipeline(&root, &config, |p| {
            p.prepare()?;
            println!("  Wrote: {}", config.bundle_original_path(&root).display());
            Ok(())
        })?,
        PackCommands::Compile => with_pipeline(&root, &config, |p| {
            let sources = p.prepare()?;
            let bundle = p.compile(&sources)?;
            println!("  Wrote: {}", bundle.display());
            Ok(())
        })?,
        PackCommands::Archive => with_pipeline(&root, &config, |p| p.archive().map(drop))?,
        PackCommands::Status => packer::build_dir::status(&root, &config)?,
        PackCommands::Clean => packer::build_dir::clean(&root, &config)?,
        PackCommands::Config => packer::print_config(&config)?,
    }

    Ok(())
}

/// Wire the real optimizer and archiver into a pipeline.
fn with_pipeline(
    root: &Path,
    config: &Config,
    f: impl FnOnce(&Pipeline<'_>) -> Result<()>,
) -> Result<()> {
    let optimizer = ClosureService::new(&config.service)?;
    let archiver = CommandArchiver::new(&config.archiver);
    f(&Pipeline::new(root, config, &optimizer, &archiver))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
