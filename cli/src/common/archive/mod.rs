//! # arcwrite Archive Utilities (`common::archive`)
//!
//! File: cli/src/common/archive/mod.rs
//!
//! ## Overview
//!
//! Everything below the pipeline that turns entries into archive bytes:
//! the writer handle, the format codecs, compression filters and output sinks.
//!
//! ## Architecture
//!
//! - **`writer`**: `ArchiveWriter`, the phase-checked handle the pipeline drives.
//! - **`format`**: numeric format/filter codes and their typed views.
//! - **`options`**: `module:key=value` option strings.
//! - **`tar`**, **`cpio`**, **`zip`**: format codecs implementing `EntryEncoder`.
//! - **`compression`**: gzip / bzip2 / zstd filter stage.
//! - **`sink`**: block framing plus file, descriptor and callback destinations.
//!
//! Byte flow for one archive:
//!
//! ```text
//! EntryEncoder ──▶ FilterWriter ──▶ BlockWriter ──▶ Destination
//!  (tar/cpio/zip)   (gzip/...)       (blocks)       (file/fd/callbacks)
//! ```
//!
use crate::common::fs::entry::RawEntry;
use std::io::{self, Read, Write};
use tracing::warn;

pub mod compression;
pub mod cpio;
pub mod format;
pub mod options;
pub mod sink;
pub mod tar;
pub mod writer;
pub mod zip;

/// A format codec. The writer calls `write_header` once per entry, then
/// `write_data` any number of times, `finish_entry` before the next header,
/// and `finish` once at close.
pub(crate) trait EntryEncoder {
    fn write_header(&mut self, out: &mut dyn Write, entry: &RawEntry) -> io::Result<()>;

    /// Returns how many bytes of `data` belong to the current entry.
    /// Zero means the entry cannot take more payload.
    fn write_data(&mut self, out: &mut dyn Write, data: &[u8]) -> io::Result<usize>;

    fn finish_entry(&mut self, out: &mut dyn Write) -> io::Result<()>;

    fn finish(&mut self, out: &mut dyn Write) -> io::Result<()>;
}

/// Payload accounting for formats whose header records the entry size up
/// front (tar, cpio).
#[derive(Debug, Default)]
pub(crate) struct EntryBudget {
    remaining: u64,
    padding: u64,
}

impl EntryBudget {
    pub(crate) fn start(&mut self, size: u64, padding: u64) {
        self.remaining = size;
        self.padding = padding;
    }

    /// Writes at most the remaining declared size.
    pub(crate) fn accept(&mut self, out: &mut dyn Write, data: &[u8]) -> io::Result<usize> {
        let n = data.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        if n > 0 {
            out.write_all(&data[..n])?;
            self.remaining -= n as u64;
        }
        Ok(n)
    }

    /// Zero-fills a short payload and writes the alignment padding.
    pub(crate) fn finish(&mut self, out: &mut dyn Write) -> io::Result<()> {
        if self.remaining > 0 {
            warn!("Entry truncated: {} bytes missing, padding with zeros", self.remaining);
        }
        write_zeros(out, self.remaining + self.padding)?;
        self.remaining = 0;
        self.padding = 0;
        Ok(())
    }
}

pub(crate) fn write_zeros(out: &mut dyn Write, count: u64) -> io::Result<()> {
    io::copy(&mut io::repeat(0).take(count), out)?;
    Ok(())
}

/// Raw bytes of a path as stored in an archive.
pub(crate) fn path_bytes(path: &std::path::Path) -> std::borrow::Cow<'_, [u8]> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        std::borrow::Cow::Borrowed(path.as_os_str().as_bytes())
    }
    #[cfg(not(unix))]
    {
        std::borrow::Cow::Owned(path.to_string_lossy().replace('\\', "/").into_bytes())
    }
}
