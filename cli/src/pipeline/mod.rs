//! # arcwrite Archive Pipeline (`pipeline`)
//!
//! File: cli/src/pipeline/mod.rs
//!
//! ## Overview
//!
//! The end-to-end archive creation routine and its three public entry points.
//! Each one writes the same archive and differs only in where the bytes go:
//!
//! - **`create_file`**: a named file, created or truncated.
//! - **`create_stream`**: an already open descriptor (stdout, a pipe, a socket).
//! - **`create_generic`**: caller-supplied [`WriteCallbacks`], which receive
//!   the archive in `block_size` blocks.
//!
//! ## Architecture
//!
//! All three delegate to one internal `create` routine, parameterized by the
//! step that binds the sink:
//!
//! 1. create an `ArchiveWriter`;
//! 2. `configure` format, filter, options and passphrase;
//! 3. bind the sink (the "opener");
//! 4. `traverse` each source path, emitting every entry below it;
//! 5. close and free the writer;
//! 6. return the list of archived entries.
//!
//! The first failure aborts the run. The writer is still closed and freed
//! (by its `Drop` impl) and the original error is returned.
//!
//! That cleanup close completes the archive framing: a truncated entry is
//! zero-filled and the end-of-archive trailer is written. The sink then holds
//! something that *looks* like a well-formed archive but is missing entries
//! or data. Treat any `Err` from these functions as "no archive" and discard
//! the output (the `arcwrite` CLI deletes the file).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use arcwrite::{create_file, CreateOptions, ARCHIVE_FORMAT_ZIP};
//!
//! # fn main() -> arcwrite::Result<()> {
//! let options = CreateOptions::default().passphrase("s3cret");
//! let entries = create_file("backup.zip", ARCHIVE_FORMAT_ZIP, &["notes", "todo.txt"], &options)?;
//! for entry in &entries {
//!     println!("{}", entry.archive_path().display());
//! }
//! # Ok(())
//! # }
//! ```
//!
use crate::common::archive::sink::WriteCallbacks;
use crate::common::archive::writer::ArchiveWriter;
use crate::common::fs::entry::SourceEntry;
use crate::core::error::Result;
use std::path::Path;
use tracing::debug;

pub mod configure;
pub mod emit;
pub mod traverse;

pub use configure::configure;
pub use emit::emit;
pub use traverse::traverse;

/// Options string applied when a passphrase is given for a zip archive.
pub const DEFAULT_OPTIONS: &str = "zip:encryption=zipcrypt";
/// Payload read size, and block size for callback sinks.
pub const DEFAULT_BLOCK_SIZE: usize = 16384;

/// Write-time settings shared by every entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOptions {
    /// Enables zip encryption. Ignored (with a warning) for other formats.
    pub passphrase: Option<String>,
    /// `module:key=value` options, applied only together with a passphrase.
    pub options: String,
    /// libarchive filter code.
    pub filter: Option<i32>,
    pub block_size: usize,
}

impl Default for CreateOptions {
    fn default() -> Self {
        CreateOptions {
            passphrase: None,
            options: DEFAULT_OPTIONS.to_string(),
            filter: None,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl CreateOptions {
    pub fn passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    pub fn options(mut self, options: impl Into<String>) -> Self {
        self.options = options.into();
        self
    }

    pub fn filter(mut self, filter: i32) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }
}

fn create<'a, P, O>(
    opener: O,
    format: i32,
    files: &[P],
    options: &CreateOptions,
) -> Result<Vec<SourceEntry>>
where
    P: AsRef<Path>,
    O: FnOnce(&mut ArchiveWriter<'a>) -> Result<()>,
{
    let mut writer = ArchiveWriter::new();
    configure(
        &mut writer,
        format,
        options.filter,
        options.passphrase.as_deref(),
        &options.options,
    )?;

    debug!("Opening archive (create).");
    opener(&mut writer)?;

    let mut added = Vec::new();
    for path in files {
        traverse(&mut writer, path.as_ref(), options.block_size, &mut added)?;
    }

    debug!("Closing archive (create).");
    writer.close()?;
    writer.free()?;
    Ok(added)
}

/// Writes an archive of `files` to the file at `path`.
///
/// On error the file is left in place and may look complete; see the
/// module docs. If `path` lies inside one of `files`, it is not archived.
pub fn create_file<P: AsRef<Path>>(
    path: impl AsRef<Path>,
    format: i32,
    files: &[P],
    options: &CreateOptions,
) -> Result<Vec<SourceEntry>> {
    let path = path.as_ref();
    create(|writer| writer.open_filename(path), format, files, options)
}

/// Writes an archive of `files` to an open descriptor. The descriptor is
/// duplicated; the caller keeps ownership of the original.
///
/// On error, bytes already written (including a cleanup trailer) stay in
/// the stream.
#[cfg(unix)]
pub fn create_stream<P: AsRef<Path>>(
    stream: &impl std::os::fd::AsFd,
    format: i32,
    files: &[P],
    options: &CreateOptions,
) -> Result<Vec<SourceEntry>> {
    let fd = stream.as_fd();
    create(|writer| writer.open_fd(fd), format, files, options)
}

/// Writes an archive of `files` through `callbacks`, in blocks of
/// `options.block_size` bytes. The final block is not padded.
///
/// This also covers in-memory output: collect the blocks into a `Vec<u8>`.
/// On error the callbacks may already have received a trailer.
pub fn create_generic<'a, P: AsRef<Path>>(
    callbacks: impl WriteCallbacks + 'a,
    format: i32,
    files: &[P],
    options: &CreateOptions,
) -> Result<Vec<SourceEntry>> {
    let opener = |writer: &mut ArchiveWriter<'a>| {
        writer.set_bytes_in_last_block(1)?;
        writer.set_bytes_per_block(options.block_size)?;
        writer.open_callbacks(Box::new(callbacks))
    };
    create(opener, format, files, options)
}
