//! # arcwrite Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//!
//! ## Overview
//!
//! Filesystem access on the source side of archive creation.
//!
//! ## Architecture
//!
//! - **`entry`**: `RawEntry` (per-entry metadata handed to the codecs) and
//!   `SourceEntry` (the record returned to callers), plus path normalization.
//! - **`walk`**: `DiskWalker`, a physical (non link-following) walk session
//!   with explicit descend.
//! - **`io`**: helpers for the output side of the CLI (`ensure_dir_exists`,
//!   `remove_partial_output`).
//!
//! Import from the submodule, e.g. `crate::common::fs::walk::DiskWalker`.
//!

/// Entry metadata and archive path normalization.
pub mod entry;
/// Small filesystem helpers for command handlers.
pub mod io;
/// The disk walker.
pub mod walk;
