//! Filesystem helpers that wait for operations to land on disk.

use anyhow::{Context, Result};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::time::Duration;

/// `create_dir` attempts while a previous delete is still pending.
const CREATE_ATTEMPTS: u32 = 20;
const CREATE_BACKOFF: Duration = Duration::from_millis(50);

/// Write `contents` to `path` and flush it to disk before returning.
pub fn write_synced(path: &Path, contents: &[u8]) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.sync_all()
        .with_context(|| format!("Failed to sync {}", path.display()))?;
    Ok(())
}

/// Copy `src` to `dest` and flush the copy to disk.
pub fn copy_synced(src: &Path, dest: &Path) -> Result<u64> {
    let bytes = std::fs::copy(src, dest)
        .with_context(|| format!("Failed to copy {} to {}", src.display(), dest.display()))?;
    std::fs::File::open(dest)
        .and_then(|f| f.sync_all())
        .with_context(|| format!("Failed to sync {}", dest.display()))?;
    Ok(bytes)
}

/// Flush directory entries (creations, renames) to disk.
#[cfg(unix)]
pub fn sync_dir(dir: &Path) -> Result<()> {
    std::fs::File::open(dir)
        .and_then(|f| f.sync_all())
        .with_context(|| format!("Failed to sync directory {}", dir.display()))
}

#[cfg(not(unix))]
pub fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

/// Remove `dir` recursively. A missing directory is not an error.
pub fn remove_dir(dir: &Path) -> Result<bool> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", dir.display())),
    }
}

/// Delete `dir` if present and create it again, empty.
///
/// On some platforms a delete completes asynchronously and `create_dir` fails
/// until it does, so creation is retried a bounded number of times.
pub fn recreate_dir(dir: &Path) -> Result<()> {
    remove_dir(dir)?;

    let mut attempt = 0;
    loop {
        attempt += 1;
        match std::fs::create_dir_all(dir) {
            Ok(()) => {
                if is_empty_dir(dir)? {
                    break;
                }
            }
            Err(e)
                if attempt < CREATE_ATTEMPTS
                    && matches!(e.kind(), ErrorKind::AlreadyExists | ErrorKind::PermissionDenied) => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create {}", dir.display()));
            }
        }
        if attempt >= CREATE_ATTEMPTS {
            anyhow::bail!("{} still has content after removal", dir.display());
        }
        tracing::debug!("waiting for {} to be released (attempt {attempt})", dir.display());
        std::thread::sleep(CREATE_BACKOFF);
        remove_dir(dir)?;
    }

    if let Some(parent) = dir.parent().filter(|p| !p.as_os_str().is_empty()) {
        sync_dir(parent)?;
    }
    Ok(())
}

/// Optional extra margin after filesystem work.
pub fn settle(ms: u64) {
    if ms > 0 {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

fn is_empty_dir(dir: &Path) -> Result<bool> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?;
    Ok(entries.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_recreate_removes_stale_content() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("build");
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("stale.js"), "old").unwrap();
        std::fs::write(dir.join("nested/also.txt"), "old").unwrap();

        recreate_dir(&dir).unwrap();

        assert!(dir.is_dir());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_recreate_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("build");
        recreate_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let tmp = TempDir::new().unwrap();
        assert!(!remove_dir(&tmp.path().join("absent")).unwrap());
    }

    #[test]
    fn test_write_synced_contents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.js");
        write_synced(&path, b"x()").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x()");
    }
}
