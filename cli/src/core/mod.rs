//! # arcwrite Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! Foundational pieces shared by the library and the binary.
//!
//! ## Architecture
//!
//! - `config`: loading, merging and validation of the TOML defaults file
//! - `error`: the `ArchiveError` type and libarchive-style status codes
//!
//! ## Usage
//!
//! ```rust
//! use arcwrite::core::config; // For loading configuration
//! use arcwrite::core::error::{ArchiveError, Result}; // For error handling
//! ```
//!
pub mod config;
pub mod error;
