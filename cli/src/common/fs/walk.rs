//! # arcwrite Disk Walker (`common::fs::walk`)
//!
//! File: cli/src/common/fs/walk.rs
//!
//! ## Overview
//!
//! `DiskWalker` is the read side of archive creation: a walk session rooted at
//! one source path that yields a `RawEntry` per filesystem object. It wraps
//! `walkdir` with the session semantics the traversal driver relies on:
//!
//! - **Explicit descend**: a directory's contents are only visited when
//!   `descend()` is called after that directory was yielded. Otherwise the
//!   next call to `next_header()` skips the subtree.
//! - **Physical symlinks**: links are never followed, including when the root
//!   itself is a symlink. A link's target is recorded in the entry.
//! - **Status codes**: `Ok(None)` is the EOF sentinel. Errors carry an
//!   `ARCHIVE_FATAL` code when the root cannot be read and `ARCHIVE_FAILED`
//!   for entries below it, along with the session's diagnostic string.
//!
//! Children of a directory are visited in file-name order so repeated runs
//! over the same tree produce identical archives.
//!
use crate::common::fs::entry::{FileType, RawEntry};
use crate::core::error::{ArchiveError, Result, ARCHIVE_FAILED, ARCHIVE_FATAL};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Walk session over one source path.
pub struct DiskWalker {
    root: PathBuf,
    iter: Option<walkdir::IntoIter>,
    pending_dir: bool,
    error: Option<String>,
}

impl DiskWalker {
    /// Opens a walk session rooted at `path`. Nothing is read from disk
    /// until the first `next_header()`.
    pub fn open(path: &Path) -> Result<Self> {
        if path.as_os_str().is_empty() {
            return Err(ArchiveError::ResourceCreation(
                "read_disk_open: empty path".to_string(),
            ));
        }
        debug!("Opening disk walk at {:?}", path);
        let iter = WalkDir::new(path)
            .follow_links(false)
            .follow_root_links(false)
            .sort_by_file_name()
            .into_iter();
        Ok(DiskWalker {
            root: path.to_path_buf(),
            iter: Some(iter),
            pending_dir: false,
            error: None,
        })
    }

    /// Produces the next entry, or `Ok(None)` once the walk is exhausted.
    pub fn next_header(&mut self) -> Result<Option<RawEntry>> {
        let Some(iter) = self.iter.as_mut() else {
            return Err(self.fail(ARCHIVE_FATAL, "walk session is closed".to_string()));
        };

        // A directory that was not descended into keeps its contents hidden.
        if std::mem::take(&mut self.pending_dir) {
            iter.skip_current_dir();
        }

        let dent = match iter.next() {
            None => return Ok(None),
            Some(Ok(dent)) => dent,
            Some(Err(err)) => {
                let code = if err.depth() == 0 {
                    ARCHIVE_FATAL
                } else {
                    ARCHIVE_FAILED
                };
                return Err(self.fail(code, err.to_string()));
            }
        };

        let metadata = match dent.metadata() {
            Ok(metadata) => metadata,
            Err(err) => return Err(self.fail(ARCHIVE_FAILED, err.to_string())),
        };
        let mut raw = RawEntry::from_metadata(dent.path(), &metadata);

        if raw.file_type() == FileType::Symlink {
            match fs::read_link(dent.path()) {
                Ok(target) => raw.set_symlink_target(target),
                Err(err) => {
                    return Err(self.fail(
                        ARCHIVE_FAILED,
                        format!("Couldn't read link {:?}: {}", dent.path(), err),
                    ))
                }
            }
        }

        self.pending_dir = raw.file_type() == FileType::Directory;
        trace!("Walked {:?} ({:?})", raw.pathname(), raw.file_type());
        Ok(Some(raw))
    }

    /// Allows the walk to enter the directory most recently returned by
    /// `next_header()`. No effect for other entry types.
    pub fn descend(&mut self) {
        self.pending_dir = false;
    }

    /// Last diagnostic recorded by this session.
    pub fn error_string(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Closes and frees the session.
    pub fn close(mut self) -> Result<()> {
        self.iter = None;
        debug!("Closed disk walk at {:?}", self.root);
        Ok(())
    }

    fn fail(&mut self, code: i32, message: String) -> ArchiveError {
        self.error = Some(message.clone());
        ArchiveError::Walk { code, message }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::tempdir;

    fn collect(walker: &mut DiskWalker, descend: bool) -> Result<Vec<RawEntry>> {
        let mut entries = Vec::new();
        while let Some(raw) = walker.next_header()? {
            if descend {
                walker.descend();
            }
            entries.push(raw);
        }
        Ok(entries)
    }

    #[test]
    fn test_walk_descends_into_directories() -> Result<()> {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.txt"), "b").unwrap();

        let mut walker = DiskWalker::open(dir.path())?;
        let entries = collect(&mut walker, true)?;
        walker.close()?;

        let names: HashSet<PathBuf> = entries.iter().map(|e| e.pathname().to_path_buf()).collect();
        assert_eq!(entries.len(), 4);
        assert!(names.contains(dir.path()));
        assert!(names.contains(&dir.path().join("a.txt")));
        assert!(names.contains(&dir.path().join("sub")));
        assert!(names.contains(&dir.path().join("sub/b.txt")));
        Ok(())
    }

    #[test]
    fn test_walk_without_descend_yields_root_only() -> Result<()> {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        let mut walker = DiskWalker::open(dir.path())?;
        let entries = collect(&mut walker, false)?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_type(), FileType::Directory);
        Ok(())
    }

    #[test]
    fn test_walk_single_file() -> Result<()> {
        let dir = tempdir().unwrap();
        let file = dir.path().join("only.txt");
        fs::write(&file, "xyz").unwrap();

        let mut walker = DiskWalker::open(&file)?;
        let entries = collect(&mut walker, true)?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].size(), 3);
        assert!(walker.next_header()?.is_none());
        Ok(())
    }

    #[test]
    fn test_walk_missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let mut walker = DiskWalker::open(&dir.path().join("missing")).unwrap();
        match walker.next_header() {
            Err(ArchiveError::Walk { code, .. }) => assert_eq!(code, ARCHIVE_FATAL),
            other => panic!("expected walk error, got {:?}", other.map(|_| ())),
        }
        assert!(walker.error_string().is_some());
    }

    #[test]
    fn test_open_empty_path_fails_creation() {
        assert!(matches!(
            DiskWalker::open(Path::new("")),
            Err(ArchiveError::ResourceCreation(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_records_symlink_target_without_following() -> Result<()> {
        let dir = tempdir().unwrap();
        let real = dir.path().join("real");
        fs::create_dir(&real).unwrap();
        fs::write(real.join("inner.txt"), "inner").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink("real", &link).unwrap();

        let mut walker = DiskWalker::open(&link)?;
        let entries = collect(&mut walker, true)?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_type(), FileType::Symlink);
        assert_eq!(entries[0].symlink_target(), Some(Path::new("real")));
        Ok(())
    }
}
