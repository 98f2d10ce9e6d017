//! # arcwrite Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Shared building blocks below the pipeline: everything that produces
//! archive bytes and everything that reads the source tree.
//!
//! ## Architecture
//!
//! - **`archive`**: the writer handle, format codecs, compression filters and
//!   output sinks.
//! - **`fs`**: source-side filesystem access: entry metadata, the disk walker
//!   and small I/O helpers used by the CLI.
//!
//! The `pipeline` module composes these; command handlers in `commands::`
//! only talk to the pipeline and to `fs::io`.
//!

/// Archive writer handle, codecs, filters and sinks.
pub mod archive;
/// Entry metadata, disk walking and I/O helpers.
pub mod fs;
