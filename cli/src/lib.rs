//! # arcwrite
//!
//! File: cli/src/lib.rs
//!
//! ## Overview
//!
//! Sequential archive writer: builds tar (ustar, GNU, pax), zip and cpio
//! (newc, odc) archives from filesystem paths, optionally compressed with
//! gzip, bzip2 or zstd, and optionally encrypted (zip only).
//!
//! ## Architecture
//!
//! - `pipeline`: the `create_*` entry points and the steps they run.
//! - `common::archive`: `ArchiveWriter` and everything below it (codecs,
//!   filters, sinks, option strings).
//! - `common::fs`: entry metadata and the disk walker.
//! - `core`: error type and configuration file loading.
//!
//! Numeric format and filter codes are libarchive's.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use arcwrite::{create_generic, CreateOptions, FnCallbacks, ARCHIVE_FILTER_GZIP, ARCHIVE_FORMAT_TAR_PAX_RESTRICTED};
//!
//! # fn main() -> arcwrite::Result<()> {
//! let mut archive = Vec::new();
//! let sink = FnCallbacks::new(|block: &[u8]| {
//!     archive.extend_from_slice(block);
//!     Ok(block.len())
//! });
//! let options = CreateOptions::default().filter(ARCHIVE_FILTER_GZIP);
//! create_generic(sink, ARCHIVE_FORMAT_TAR_PAX_RESTRICTED, &["src"], &options)?;
//! # Ok(())
//! # }
//! ```
//!
pub mod common;
pub mod core;
pub mod pipeline;

pub use common::archive::format::*;
pub use common::archive::sink::{FnCallbacks, WriteCallbacks};
pub use common::archive::writer::{ArchiveWriter, Phase};
pub use common::fs::entry::{FileType, RawEntry, SourceEntry};
pub use crate::core::error::{
    ArchiveError, Result, ARCHIVE_EOF, ARCHIVE_FAILED, ARCHIVE_FATAL, ARCHIVE_OK, ARCHIVE_WARN,
};
#[cfg(unix)]
pub use pipeline::create_stream;
pub use pipeline::{create_file, create_generic, CreateOptions, DEFAULT_BLOCK_SIZE, DEFAULT_OPTIONS};
