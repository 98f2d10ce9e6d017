//! # arcwrite Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! The subcommands of the `arcwrite` binary. Each module defines its clap
//! arguments struct and a `handle_*` function that `main.rs` dispatches to.
//!
//! ## Command Groups
//!
//! - `create`: write an archive from files and directories
//! - `formats`: list supported formats and filters with their codes
//!

/// `arcwrite create`: builds an archive through the library pipeline.
pub mod create;
/// `arcwrite formats`: prints the format and filter tables.
pub mod formats;
