//! # arcwrite Entry Metadata (`common::fs::entry`)
//!
//! File: cli/src/common/fs/entry.rs
//!
//! ## Overview
//!
//! Two value types describe one filesystem object on its way into an archive:
//!
//! - **`RawEntry`**: the mutable, single-entry metadata object produced by the
//!   disk walker and consumed by the writer's codec when it emits a header.
//!   It lives for exactly one iteration of the traversal loop.
//! - **`SourceEntry`**: the immutable snapshot returned to the caller, holding
//!   both the path as walked and the normalized (relative) archive path.
//!
//! Normalization strips every leading separator from an absolute path, so
//! the name stored in the archive is always relative. The rest of the path is
//! kept as-is.
//!
use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};

/// Kind of filesystem object, as recorded in the archive header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Regular,
    Directory,
    Symlink,
    CharDevice,
    BlockDevice,
    Fifo,
    Socket,
}

impl FileType {
    /// Classifies an `lstat` result. Never follows symlinks.
    pub fn from_std(file_type: std::fs::FileType) -> Self {
        if file_type.is_symlink() {
            return FileType::Symlink;
        }
        if file_type.is_dir() {
            return FileType::Directory;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if file_type.is_char_device() {
                return FileType::CharDevice;
            }
            if file_type.is_block_device() {
                return FileType::BlockDevice;
            }
            if file_type.is_fifo() {
                return FileType::Fifo;
            }
            if file_type.is_socket() {
                return FileType::Socket;
            }
        }
        FileType::Regular
    }

    /// POSIX `S_IFMT` bits for this type.
    pub fn mode_bits(self) -> u32 {
        match self {
            FileType::Regular => 0o100000,
            FileType::Directory => 0o040000,
            FileType::Symlink => 0o120000,
            FileType::CharDevice => 0o020000,
            FileType::BlockDevice => 0o060000,
            FileType::Fifo => 0o010000,
            FileType::Socket => 0o140000,
        }
    }
}

/// Metadata for a single walked filesystem object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pathname: PathBuf,
    source_path: PathBuf,
    file_type: FileType,
    size: u64,
    mode: u32,
    uid: u64,
    gid: u64,
    mtime: i64,
    rdev: u64,
    dev: u64,
    ino: u64,
    symlink_target: Option<PathBuf>,
}

impl RawEntry {
    /// Builds an entry from `lstat` metadata. `path` is both the initial
    /// pathname and the physical source location.
    pub fn from_metadata(path: &Path, metadata: &Metadata) -> Self {
        let file_type = FileType::from_std(metadata.file_type());
        let size = match file_type {
            FileType::Regular => metadata.len(),
            _ => 0,
        };

        #[cfg(unix)]
        let (mode, uid, gid, mtime, rdev, dev, ino) = {
            use std::os::unix::fs::MetadataExt;
            (
                metadata.mode() & 0o7777,
                u64::from(metadata.uid()),
                u64::from(metadata.gid()),
                metadata.mtime(),
                metadata.rdev(),
                metadata.dev(),
                metadata.ino(),
            )
        };
        #[cfg(not(unix))]
        let (mode, uid, gid, mtime, rdev, dev, ino) = {
            let mode = match file_type {
                FileType::Directory => 0o755,
                _ if metadata.permissions().readonly() => 0o444,
                _ => 0o644,
            };
            let mtime = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);
            (mode, 0, 0, mtime, 0, 0, 0)
        };

        RawEntry {
            pathname: path.to_path_buf(),
            source_path: path.to_path_buf(),
            file_type,
            size,
            mode,
            uid,
            gid,
            mtime,
            rdev,
            dev,
            ino,
            symlink_target: None,
        }
    }

    /// Creates an entry without touching the filesystem.
    pub fn new(pathname: impl Into<PathBuf>, file_type: FileType) -> Self {
        let pathname = pathname.into();
        RawEntry {
            source_path: pathname.clone(),
            pathname,
            file_type,
            size: 0,
            mode: if file_type == FileType::Directory { 0o755 } else { 0o644 },
            uid: 0,
            gid: 0,
            mtime: 0,
            rdev: 0,
            dev: 0,
            ino: 0,
            symlink_target: None,
        }
    }

    pub fn pathname(&self) -> &Path {
        &self.pathname
    }

    pub fn set_pathname(&mut self, pathname: impl Into<PathBuf>) {
        self.pathname = pathname.into();
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn set_size(&mut self, size: u64) {
        self.size = size;
    }

    /// Permission bits only (no `S_IFMT` bits).
    pub fn mode(&self) -> u32 {
        self.mode
    }

    pub fn set_mode(&mut self, mode: u32) {
        self.mode = mode & 0o7777;
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn gid(&self) -> u64 {
        self.gid
    }

    pub fn mtime(&self) -> i64 {
        self.mtime
    }

    pub fn set_mtime(&mut self, mtime: i64) {
        self.mtime = mtime;
    }

    pub fn rdev(&self) -> u64 {
        self.rdev
    }

    /// Device major number (glibc `gnu_dev_major` encoding).
    pub fn rdev_major(&self) -> u32 {
        (((self.rdev >> 32) & 0xffff_f000) | ((self.rdev >> 8) & 0x0000_0fff)) as u32
    }

    /// Device minor number (glibc `gnu_dev_minor` encoding).
    pub fn rdev_minor(&self) -> u32 {
        (((self.rdev >> 12) & 0xffff_ff00) | (self.rdev & 0x0000_00ff)) as u32
    }

    pub fn symlink_target(&self) -> Option<&Path> {
        self.symlink_target.as_deref()
    }

    pub fn set_symlink_target(&mut self, target: impl Into<PathBuf>) {
        self.symlink_target = Some(target.into());
    }

    /// `(dev, ino)` of the source object; `None` when it was not taken
    /// from disk.
    pub fn file_id(&self) -> Option<(u64, u64)> {
        (self.ino != 0).then_some((self.dev, self.ino))
    }
}

/// Snapshot of one archived filesystem object, returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    path: PathBuf,
    archive_path: PathBuf,
    file_type: FileType,
    symlink_target: Option<PathBuf>,
    source_path: PathBuf,
    size: u64,
    mode: u32,
    uid: u64,
    gid: u64,
    mtime: i64,
}

impl SourceEntry {
    /// Snapshots `raw`. The archive path starts out equal to the walked path
    /// until [`SourceEntry::normalize`] runs.
    pub fn from_raw(raw: &RawEntry) -> Self {
        SourceEntry {
            path: raw.pathname().to_path_buf(),
            archive_path: raw.pathname().to_path_buf(),
            file_type: raw.file_type(),
            symlink_target: None,
            source_path: raw.source_path().to_path_buf(),
            size: raw.size(),
            mode: raw.mode(),
            uid: raw.uid(),
            gid: raw.gid(),
            mtime: raw.mtime(),
        }
    }

    /// Makes the archive path relative and writes it back into `raw`, so the
    /// header emitted from `raw` carries the relative name.
    pub fn normalize(&mut self, raw: &mut RawEntry) {
        if self.archive_path.has_root() {
            self.archive_path = strip_leading_separators(&self.archive_path);
            raw.set_pathname(self.archive_path.clone());
        }
    }

    /// The path as produced by the walk (may be absolute).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The name stored in the archive. Never absolute.
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Link target, resolved one level. Present only for symlinks.
    pub fn symlink_target(&self) -> Option<&Path> {
        self.symlink_target.as_deref()
    }

    pub(crate) fn set_symlink_target(&mut self, target: PathBuf) {
        self.symlink_target = Some(target);
    }

    /// Physical location the payload is read from.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mode(&self) -> u32 {
        self.mode
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn gid(&self) -> u64 {
        self.gid
    }

    pub fn mtime(&self) -> i64 {
        self.mtime
    }
}

/// Removes every root/prefix component from the front of `path`.
/// A path made only of separators becomes `"."`.
pub fn strip_leading_separators(path: &Path) -> PathBuf {
    let mut components = path.components();
    while matches!(
        components.clone().next(),
        Some(Component::RootDir | Component::Prefix(_))
    ) {
        components.next();
    }
    let rest = components.as_path();
    if rest.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        rest.to_path_buf()
    }
}
