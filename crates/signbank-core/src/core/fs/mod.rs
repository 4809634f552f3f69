//! Filesystem utilities.
//!
//! Crash-tolerant file writes for the index document and pipeline config.
//! A partial write (power loss, crash mid-run) must not leave a previously
//! good index unreadable, so writes go through a temp file and an atomic
//! rename with a `.bak` swap for platforms where rename-over-existing fails.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::{PipelineError, PipelineResult};

/// Write bytes to `path` using an atomic replace pattern.
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = sibling_path(path, "tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    atomic_replace(path, &tmp_path)?;
    Ok(())
}

/// Write a JSON document atomically with pretty formatting.
pub fn atomic_write_json_pretty<T: serde::Serialize>(path: &Path, value: &T) -> PipelineResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    atomic_write_bytes(path, &bytes)
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut sibling = path.to_path_buf();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| suffix.to_string());
    sibling.set_file_name(format!("{file_name}.{suffix}"));
    sibling
}

fn atomic_replace(dest: &Path, src_tmp: &Path) -> PipelineResult<()> {
    // First write: nothing to preserve, a plain rename suffices.
    if !dest.exists() {
        std::fs::rename(src_tmp, dest)?;
        return Ok(());
    }

    // Rename-over-existing is not atomic everywhere (notably NTFS), so the
    // old document moves aside first and the new one takes its place.
    let bak = sibling_path(dest, "bak");

    if bak.exists() {
        let _ = std::fs::remove_file(&bak);
    }

    std::fs::rename(dest, &bak)?;
    match std::fs::rename(src_tmp, dest) {
        Ok(()) => {
            let _ = std::fs::remove_file(&bak);
            Ok(())
        }
        Err(e) => {
            // Put the prior document back so a failed write never loses it.
            let _ = std::fs::rename(&bak, dest);
            let _ = std::fs::remove_file(src_tmp);
            Err(PipelineError::Io(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_bytes_creates_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");

        atomic_write_bytes(&path, b"one").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one");

        atomic_write_bytes(&path, b"two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
    }

    #[test]
    fn atomic_write_creates_missing_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metadata").join("nested").join("index.json");

        atomic_write_bytes(&path, b"{}").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn atomic_write_json_pretty_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");

        let value = serde_json::json!({"a": 1, "b": ["x", "y"]});
        atomic_write_json_pretty(&path, &value).unwrap();

        let read: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, value);
    }

    #[test]
    fn atomic_write_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");

        atomic_write_bytes(&path, b"one").unwrap();
        atomic_write_bytes(&path, b"two").unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["index.json".to_string()]);
    }
}
