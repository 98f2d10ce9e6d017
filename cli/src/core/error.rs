//! # arcwrite Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error type returned by every fallible operation of
//! the archive-writing library, together with the numeric status codes the
//! disk walker and writer handle report alongside their diagnostics.
//!
//! ## Architecture
//!
//! - `ArchiveError`: a `thiserror` enum. All lower-level failures (I/O errors,
//!   codec rejections, phase violations) collapse into one of its variants.
//! - `Result<T>`: alias over `std::result::Result<T, ArchiveError>` for the
//!   library. The CLI layer wraps these in `anyhow::Error` with context.
//!
//! Failures on a live handle (`ArchiveWriter`, `DiskWalker`) always carry the
//! handle's last diagnostic string. Handle *creation* failures carry only the
//! name of the operation, since no handle exists to query.
//!
//! ## Examples
//!
//! ```rust
//! use arcwrite::ArchiveError;
//!
//! fn report(err: &ArchiveError) {
//!     match err {
//!         ArchiveError::WriteData(diag) => eprintln!("partial write: {diag}"),
//!         other => eprintln!("archive failed: {other}"),
//!     }
//! }
//! ```
//!
use thiserror::Error;

/// Operation completed.
pub const ARCHIVE_OK: i32 = 0;
/// End of the walk (no more entries).
pub const ARCHIVE_EOF: i32 = 1;
/// Operation completed with a warning.
pub const ARCHIVE_WARN: i32 = -20;
/// The current entry could not be processed; the handle is still usable.
pub const ARCHIVE_FAILED: i32 = -25;
/// The handle is unusable.
pub const ARCHIVE_FATAL: i32 = -30;

/// Error type for the archive-writing pipeline.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Handle allocation failed; no diagnostic is retrievable.
    #[error("Could not create archive resource ({0}).")]
    ResourceCreation(String),

    /// An operation on a live writer or walker handle failed.
    #[error("{message}")]
    Archive { message: String },

    /// A non-empty chunk was accepted with zero bytes written.
    #[error("No bytes were written. Error? [{0}]")]
    WriteData(String),

    /// The disk walker could not produce the next entry header.
    #[error("Could not build header from physical source file during create: ({code}) [{message}]")]
    Walk { code: i32, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ArchiveError {
    pub(crate) fn archive(message: impl Into<String>) -> Self {
        ArchiveError::Archive {
            message: message.into(),
        }
    }
}

/// Result alias used throughout the library.
pub type Result<T, E = ArchiveError> = std::result::Result<T, E>;
