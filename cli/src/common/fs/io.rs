//! # arcwrite Filesystem I/O Helpers
//!
//! File: cli/src/common/fs/io.rs
//!
//! ## Overview
//!
//! Small wrappers around `std::fs` used by the command handlers on the
//! output side of archive creation.
//!
//! ## Architecture
//!
//! - **`ensure_dir_exists`**: creates a directory (and its parents) when
//!   missing; fails if the path exists but is not a directory. Used for the
//!   parent of the output archive.
//! - **`remove_partial_output`**: deletes an output file left behind by a
//!   failed run, so a partial archive is never mistaken for a valid one.
//!
//! Both return `anyhow::Result` with context, like the rest of the CLI layer.
//!
use crate::core::error::ArchiveError;
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

/// Ensures that a directory exists at `path`, creating intermediate
/// directories as needed (like `mkdir -p`).
///
/// # Errors
///
/// Fails if the path exists but is not a directory, or if creation fails.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {:?}", path))?;
        info!("Created directory: {:?}", path);
    } else if !path.is_dir() {
        anyhow::bail!(ArchiveError::Config(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    } else {
        debug!("Directory already exists: {:?}", path);
    }
    Ok(())
}

/// Removes the output file of a failed run. A missing file is not an error.
///
/// Returns `true` if a file was removed.
pub fn remove_partial_output(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            warn!("Removed partial archive {:?}", path);
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to remove partial archive {:?}", path)),
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_dir_exists_creates_new() -> Result<()> {
        let base_dir = tempdir()?;
        let new_dir = base_dir.path().join("new/subdir");
        assert!(!new_dir.exists());
        ensure_dir_exists(&new_dir)?;
        assert!(new_dir.is_dir());
        Ok(())
    }

    #[test]
    fn test_ensure_dir_exists_already_exists() -> Result<()> {
        let base_dir = tempdir()?;
        let existing_dir = base_dir.path().join("existing");
        fs::create_dir(&existing_dir)?;
        ensure_dir_exists(&existing_dir)?;
        assert!(existing_dir.is_dir());
        Ok(())
    }

    #[test]
    fn test_ensure_dir_exists_path_is_file() -> Result<()> {
        let base_dir = tempdir()?;
        let file_path = base_dir.path().join("a_file.txt");
        fs::write(&file_path, "hello")?;
        let result = ensure_dir_exists(&file_path);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Path exists but is not a directory"));
        Ok(())
    }

    #[test]
    fn test_remove_partial_output() -> Result<()> {
        let base_dir = tempdir()?;
        let file_path = base_dir.path().join("partial.tar");
        fs::write(&file_path, b"half an archive")?;
        assert!(remove_partial_output(&file_path)?);
        assert!(!file_path.exists());
        // Second removal finds nothing.
        assert!(!remove_partial_output(&file_path)?);
        Ok(())
    }
}
