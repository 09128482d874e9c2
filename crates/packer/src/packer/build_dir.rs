//! Build directory preparation, cleanup and status.

#![allow(clippy::cast_precision_loss)] // File sizes don't need u64 precision for display

use super::collect::Sources;
use super::config::Config;
use super::fsync;
use anyhow::{Context, Result};
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Recreate the build directory, copy the assets and write the original bundle.
///
/// Returns the build directory path. A failure partway leaves it partially
/// populated.
pub fn prepare(root: &Path, config: &Config, sources: &Sources) -> Result<PathBuf> {
    println!("Creating build directory...");

    let dir = config.build_dir_path(root)?;
    fsync::recreate_dir(&dir)?;
    fsync::settle(config.settle_ms);

    for asset in &config.assets {
        let src = root.join(asset);
        let dest = dir.join(flat_name(asset)?);
        let bytes = fsync::copy_synced(&src, &dest)?;
        tracing::debug!("copied {} -> {} ({bytes} bytes)", src.display(), dest.display());
    }

    fsync::write_synced(
        &config.bundle_original_path(root),
        sources.bundle.as_bytes(),
    )?;
    fsync::sync_dir(&dir)?;

    Ok(dir)
}

/// Remove the build directory.
pub fn clean(root: &Path, config: &Config) -> Result<()> {
    let dir = config.build_dir_path(root)?;
    if fsync::remove_dir(&dir)? {
        println!("Cleaned: {}", dir.display());
    } else {
        println!("{} not present", dir.display());
    }
    Ok(())
}

/// Show which inputs exist and which artifacts have been produced.
pub fn status(root: &Path, config: &Config) -> Result<()> {
    print!("{}", status_listing(root, config));
    Ok(())
}

#[must_use]
pub fn status_listing(root: &Path, config: &Config) -> String {
    let mut out = String::from("Inputs:\n\n");
    let inputs = config
        .scripts
        .iter()
        .map(|p| ("script", p))
        .chain(std::iter::once(("externs", &config.externs)))
        .chain(config.assets.iter().map(|p| ("asset", p)));

    let mut missing = 0;
    for (kind, path) in inputs {
        if root.join(path).is_file() {
            let _ = writeln!(out, "  {kind:8} [ok]      {}", path.display());
        } else {
            missing += 1;
            let _ = writeln!(out, "  {kind:8} [missing] {}", path.display());
        }
    }

    out.push_str("\nArtifacts:\n\n");
    for path in [
        config.bundle_original_path(root),
        config.bundle_path(root),
        config.archive_path(root),
    ] {
        let _ = match std::fs::metadata(&path) {
            Ok(meta) => writeln!(
                out,
                "  {} ({:.1} KB)",
                path.display(),
                meta.len() as f64 / 1_000.0
            ),
            Err(_) => writeln!(out, "  {} [not built]", path.display()),
        };
    }

    if missing > 0 {
        let _ = writeln!(out, "\n  {missing} input(s) missing");
    }
    out
}

/// File name an asset gets inside the build directory.
fn flat_name(asset: &Path) -> Result<&std::ffi::OsStr> {
    asset
        .file_name()
        .with_context(|| format!("Asset path has no file name: {}", asset.display()))
}
