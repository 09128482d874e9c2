//! Release pipeline for the game bundle.
//!
//! Structure:
//! - `config` - Project layout, service flags, archiver command
//! - `collect` - Script concatenation and externs loading
//! - `build_dir` - Build directory recreation, cleanup, status
//! - `closure` - Closure Compiler Service client
//! - `report` - Server errors, compile errors, warnings, statistics
//! - `archive` - External archiver invocation
//! - `fsync` - Synced filesystem writes

pub mod archive;
pub mod build_dir;
pub mod closure;
pub mod collect;
pub mod config;
pub mod error;
pub mod fsync;
pub mod report;

use anyhow::{Context, Result};
use archive::Archiver;
use clap::Subcommand;
use closure::Optimizer;
use collect::Sources;
use config::Config;
use error::PipelineError;
use std::path::{Path, PathBuf};

/// Build commands for the CLI.
#[derive(Subcommand)]
pub enum PackCommands {
    /// Bundle, optimize and archive (the full release build)
    All,
    /// Collect sources and prepare the build directory (no network)
    Prepare,
    /// Prepare, optimize and write the optimized bundle (no archive)
    Compile,
    /// Archive an existing optimized bundle with the assets
    Archive,
    /// Show inputs and build artifacts
    Status,
    /// Remove the build directory
    Clean,
    /// Print the effective configuration
    Config,
}

/// The five build stages, wired to an optimizer and an archiver.
pub struct Pipeline<'a> {
    root: &'a Path,
    config: &'a Config,
    optimizer: &'a dyn Optimizer,
    archiver: &'a dyn Archiver,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        root: &'a Path,
        config: &'a Config,
        optimizer: &'a dyn Optimizer,
        archiver: &'a dyn Archiver,
    ) -> Self {
        Self {
            root,
            config,
            optimizer,
            archiver,
        }
    }

    /// Run every stage. Returns the archive size in bytes.
    pub fn run(&self) -> Result<u64> {
        println!("=== Packing release ===\n");

        let sources = self.prepare()?;
        self.compile(&sources)?;
        let size = self.archive()?;

        println!("\n=== Build complete ===");
        Ok(size)
    }

    /// Collect the sources and recreate the build directory.
    pub fn prepare(&self) -> Result<Sources> {
        let sources = collect::collect(self.root, self.config)?;
        build_dir::prepare(self.root, self.config, &sources)?;
        Ok(sources)
    }

    /// Optimize `sources` and write the optimized bundle.
    ///
    /// Nothing is written when the service reports server or compile errors.
    pub fn compile(&self, sources: &Sources) -> Result<PathBuf> {
        let response = self.optimizer.compile(sources)?;
        report::report(&response, &self.config.bundle_original)?;

        let code = response
            .compiled_code
            .ok_or(PipelineError::MissingCompiledCode)?;

        let path = self.config.bundle_path(self.root);
        fsync::write_synced(&path, code.as_bytes())?;
        fsync::settle(self.config.settle_ms);
        Ok(path)
    }

    /// Archive the optimized bundle with the original assets.
    pub fn archive(&self) -> Result<u64> {
        let bundle = self.config.bundle_path(self.root);
        if !bundle.is_file() {
            anyhow::bail!(
                "Optimized bundle not found: {}. Run: packer compile",
                bundle.display()
            );
        }

        let size = archive::create(
            self.archiver,
            self.root,
            &self.config.build_dir.join(&self.config.archive),
            &self.config.build_dir.join(&self.config.bundle),
            &self.config.assets,
        )?;
        fsync::settle(self.config.settle_ms);
        Ok(size)
    }
}

/// Print the effective configuration as JSON.
pub fn print_config(config: &Config) -> Result<()> {
    println!("{}", config_json(config)?);
    Ok(())
}

pub fn config_json(config: &Config) -> Result<String> {
    serde_json::to_string_pretty(config).context("Failed to serialize config")
}
