//! Release archive creation through an external archiver.

use super::config::ArchiverConfig;
use super::error::PipelineError;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Packs `inputs` into a new archive at `archive`.
///
/// Relative paths are resolved against `root`.
pub trait Archiver {
    fn archive(&self, root: &Path, archive: &Path, inputs: &[PathBuf]) -> Result<()>;
}

/// Runs `program args... <archive> <inputs...>` from the project root.
pub struct CommandArchiver {
    program: String,
    args: Vec<String>,
}

impl CommandArchiver {
    pub fn new(config: &ArchiverConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }
}

impl Archiver for CommandArchiver {
    fn archive(&self, root: &Path, archive: &Path, inputs: &[PathBuf]) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(archive)
            .args(inputs)
            .current_dir(root)
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());
        tracing::debug!("running {cmd:?}");

        let status = cmd
            .status()
            .with_context(|| format!("Failed to run archiver: {}", self.program))?;

        if !status.success() {
            return Err(PipelineError::ArchiverFailed {
                program: self.program.clone(),
                status: status.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Archive the optimized bundle with the original assets and return the
/// archive size in bytes.
///
/// Any archive left by an earlier run is removed first so the archiver
/// always starts a new one.
pub fn create(
    archiver: &dyn Archiver,
    root: &Path,
    archive: &Path,
    bundle: &Path,
    assets: &[PathBuf],
) -> Result<u64> {
    println!("\nZipping bundle...");

    let archive_path = root.join(archive);
    if archive_path.exists() {
        std::fs::remove_file(&archive_path)
            .with_context(|| format!("Failed to remove stale {}", archive_path.display()))?;
    }

    let inputs: Vec<PathBuf> = std::iter::once(bundle.to_path_buf())
        .chain(assets.iter().cloned())
        .collect();
    archiver.archive(root, archive, &inputs)?;

    let size = std::fs::metadata(&archive_path)
        .with_context(|| format!("Archive not found after archiving: {}", archive_path.display()))?
        .len();
    println!("  Final ZIP size: {size} bytes");
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn script_archiver(root: &Path, body: &str) -> CommandArchiver {
        let script = root.join("fake-archiver.sh");
        std::fs::write(&script, format!("{body}\n")).unwrap();
        CommandArchiver::new(&ArchiverConfig {
            program: "sh".to_string(),
            args: vec![script.to_string_lossy().into_owned(), "a".to_string()],
        })
    }

    #[cfg(unix)]
    #[test]
    fn test_command_receives_archive_then_inputs() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join("build")).unwrap();
        // Record argv, one per line, and produce the archive.
        let archiver = script_archiver(
            root,
            "for a in \"$@\"; do echo \"$a\" >> args.txt; done; echo zip > \"$2\"",
        );

        let size = create(
            &archiver,
            root,
            Path::new("build/compressed.zip"),
            Path::new("build/bundle.js"),
            &[PathBuf::from("src/index.html")],
        )
        .unwrap();

        assert_eq!(size, 4);
        assert_eq!(
            std::fs::read_to_string(root.join("args.txt")).unwrap(),
            "a\nbuild/compressed.zip\nbuild/bundle.js\nsrc/index.html\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_reported() {
        let tmp = TempDir::new().unwrap();
        let archiver = script_archiver(tmp.path(), "exit 2");

        let err = create(
            &archiver,
            tmp.path(),
            Path::new("compressed.zip"),
            Path::new("bundle.js"),
            &[],
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::ArchiverFailed { .. })
        ));
    }

    #[test]
    fn test_missing_program_fails() {
        let tmp = TempDir::new().unwrap();
        let archiver = CommandArchiver::new(&ArchiverConfig {
            program: "definitely-not-an-archiver-7f3a".to_string(),
            args: vec!["a".to_string()],
        });
        assert!(create(
            &archiver,
            tmp.path(),
            Path::new("compressed.zip"),
            Path::new("bundle.js"),
            &[],
        )
        .is_err());
    }
}
