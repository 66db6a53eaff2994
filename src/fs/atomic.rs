//! Atomic file write operations.
//!
//! Crawl reports and generated config must never be observable in a
//! half-written state, so every write goes through a temp-file, fsync,
//! rename sequence. Rename is atomic when source and destination share a
//! filesystem, which holds here because the temp file is created in the
//! target's own directory.

use crate::error::{Result, TrawlError};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically write bytes to a file.
///
/// Writes to `.{filename}.tmp` in the target directory, syncs, then renames
/// over the target. On crash, at worst the temp file remains; the target is
/// never partial.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            TrawlError::UserError(format!(
                "failed to create parent directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = temp_path_for(path)?;
    write_and_sync(&temp_path, content)?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        TrawlError::UserError(format!(
            "failed to atomically replace '{}': {}",
            path.display(),
            e
        ))
    })?;

    // Persist the directory entry as well.
    if let Some(parent) = path.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}

/// Atomically write a string to a file.
pub fn atomic_write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Temp file path in the same directory as the target.
fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| TrawlError::UserError("invalid file path".to_string()))?;
    Ok(parent.join(format!(".{}.tmp", filename)))
}

/// Write content to a file and sync it to disk.
fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        TrawlError::UserError(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.write_all(content).map_err(|e| {
        let _ = fs::remove_file(path);
        TrawlError::UserError(format!("failed to write to temporary file: {}", e))
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(path);
        TrawlError::UserError(format!("failed to sync temporary file to disk: {}", e))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_new_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("report.json");

        atomic_write(&file_path, b"{\"artifacts\": 3}").unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "{\"artifacts\": 3}");
    }

    #[test]
    fn atomic_write_replaces_existing_content() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("report.json");

        fs::write(&file_path, "original").unwrap();
        atomic_write(&file_path, b"replacement").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "replacement");
    }

    #[test]
    fn atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("nested").join("report.json");

        atomic_write_file(&file_path, "content").unwrap();
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "content");
    }

    #[test]
    fn temp_file_does_not_linger() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("report.json");

        atomic_write(&file_path, b"content").unwrap();
        assert!(!temp_dir.path().join(".report.json.tmp").exists());
    }

    #[test]
    fn concurrent_writes_to_distinct_files_are_independent() {
        let temp_dir = TempDir::new().unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = temp_dir.path().join(format!("file_{}.txt", i));
                let content = format!("content {}", i);
                std::thread::spawn(move || {
                    atomic_write_file(&path, &content).unwrap();
                    (path, content)
                })
            })
            .collect();

        for handle in handles {
            let (path, expected) = handle.join().unwrap();
            assert_eq!(fs::read_to_string(&path).unwrap(), expected);
        }
    }
}
