//! # arcwrite Writer Handle (`common::archive::writer`)
//!
//! File: cli/src/common/archive/writer.rs
//!
//! ## Overview
//!
//! `ArchiveWriter` is the handle one archive is written through. It carries
//! the configuration (format, filter, options, passphrase, block sizes), owns
//! the bound sink, and enforces the order in which operations may be called.
//!
//! ## Architecture
//!
//! The handle moves through these phases:
//!
//! ```text
//! Created ──set_format──▶ Configured ──open_*──▶ SinkBound ──write_header──▶ Writing
//!                                                    │                          │
//!                                                    └──────────close───────────┴──▶ Closed ──free──▶ Freed
//! ```
//!
//! Calling an operation in the wrong phase fails with `ArchiveError::Archive`
//! and records the diagnostic in `error_string()`. `close()` runs at most once.
//! `free()` consumes the handle; dropping a handle that was never freed
//! performs a best-effort close and logs (but does not return) any failure.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use arcwrite::{ArchiveWriter, FileType, RawEntry, ARCHIVE_FORMAT_TAR_USTAR};
//!
//! # fn main() -> arcwrite::Result<()> {
//! let mut writer = ArchiveWriter::new();
//! writer.set_format(ARCHIVE_FORMAT_TAR_USTAR)?;
//! writer.open_filename("out.tar".as_ref())?;
//! let mut entry = RawEntry::new("hello.txt", FileType::Regular);
//! entry.set_size(5);
//! writer.write_header(&entry)?;
//! writer.write_data(b"hello")?;
//! writer.free()?;
//! # Ok(())
//! # }
//! ```
//!
use crate::common::archive::compression::FilterWriter;
use crate::common::archive::cpio::{CpioEncoder, CpioFlavor};
use crate::common::archive::format::{unsupported_filter_name, FilterCode, FormatCode};
use crate::common::archive::options::{parse_options, FilterSettings, ZipSettings};
use crate::common::archive::sink::{BlockWriter, Destination, WriteCallbacks};
use crate::common::archive::tar::{TarEncoder, TarFlavor};
use crate::common::archive::zip::ZipEncoder;
use crate::common::archive::EntryEncoder;
use crate::common::fs::entry::RawEntry;
use crate::core::error::{ArchiveError, Result};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::{debug, trace, warn};

/// libarchive's default write block size.
pub const DEFAULT_BYTES_PER_BLOCK: usize = 10240;

/// Lifecycle phase of an [`ArchiveWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Configured,
    SinkBound,
    Writing,
    Closed,
    Freed,
}

/// Handle for writing one archive.
pub struct ArchiveWriter<'a> {
    phase: Phase,
    format: Option<FormatCode>,
    filter: Option<FilterCode>,
    zip: ZipSettings,
    filter_settings: FilterSettings,
    passphrase: Option<String>,
    bytes_per_block: usize,
    bytes_in_last_block: Option<usize>,
    encoder: Option<Box<dyn EntryEncoder>>,
    output: Option<FilterWriter<BlockWriter<'a>>>,
    /// `(dev, ino)` of the file being written, if the sink is a file.
    skip_file: Option<(u64, u64)>,
    error: Option<String>,
}

impl Default for ArchiveWriter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ArchiveWriter<'a> {
    pub fn new() -> Self {
        ArchiveWriter {
            phase: Phase::Created,
            format: None,
            filter: None,
            zip: ZipSettings::default(),
            filter_settings: FilterSettings::default(),
            passphrase: None,
            bytes_per_block: DEFAULT_BYTES_PER_BLOCK,
            bytes_in_last_block: None,
            encoder: None,
            output: None,
            skip_file: None,
            error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn format(&self) -> Option<FormatCode> {
        self.format
    }

    pub fn filter(&self) -> Option<FilterCode> {
        self.filter
    }

    /// Identity of the output file, so a walk can leave the archive itself
    /// out. `None` for callback sinks.
    pub fn skip_file(&self) -> Option<(u64, u64)> {
        self.skip_file
    }

    /// Diagnostic recorded by the most recent failing operation.
    pub fn error_string(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // --- Configuration ---

    /// Selects the archive format by libarchive code. May be called again to
    /// replace the format until a sink is bound.
    pub fn set_format(&mut self, code: i32) -> Result<()> {
        self.expect_phase(&[Phase::Created, Phase::Configured], "set_format")?;
        let format = FormatCode::from_code(code)
            .ok_or_else(|| self.fail(format!("Unsupported format code: {:#x}", code)))?;
        debug!("Archive format set to {}", format.name());
        self.format = Some(format);
        self.phase = Phase::Configured;
        Ok(())
    }

    /// Adds a compression filter by libarchive code. At most one filter
    /// besides `none` is supported.
    pub fn add_filter(&mut self, code: i32) -> Result<()> {
        self.expect_phase(&[Phase::Configured], "add_filter")?;
        let filter = match FilterCode::from_code(code) {
            Some(filter) => filter,
            None => {
                let message = match unsupported_filter_name(code) {
                    Some(name) => format!("Unsupported filter: {}", name),
                    None => format!("Unknown filter code: {}", code),
                };
                return Err(self.fail(message));
            }
        };
        if filter == FilterCode::None {
            return Ok(());
        }
        if let Some(existing) = self.filter {
            return Err(self.fail(format!(
                "Cannot add {} filter: {} is already set",
                filter.name(),
                existing.name()
            )));
        }
        debug!("Archive filter set to {}", filter.name());
        self.filter = Some(filter);
        Ok(())
    }

    /// Applies a `module:key=value,...` options string to the active format
    /// and filter.
    pub fn set_options(&mut self, options: &str) -> Result<()> {
        self.expect_phase(&[Phase::Configured], "set_options")?;
        let parsed = parse_options(options).map_err(|message| self.fail(message))?;
        let format_module = self.format.map(FormatCode::module);
        let filter = self.filter;

        for option in &parsed {
            let for_format = option.module.is_none() || option.module.as_deref() == format_module;
            let for_filter = match (option.module.as_deref(), filter) {
                (None, Some(_)) => true,
                (Some(module), Some(filter)) => module == filter.name(),
                _ => false,
            };
            if !for_format && !for_filter {
                debug!("Ignoring option for inactive module: {}", option.qualified_key());
                continue;
            }

            let mut known = false;
            if for_format && self.format == Some(FormatCode::Zip) {
                known |= self.zip.apply(option).map_err(|message| self.fail(message))?;
            }
            if let (true, Some(filter)) = (for_filter, filter) {
                known |= self
                    .filter_settings
                    .apply(filter, option)
                    .map_err(|message| self.fail(message))?;
            }
            if !known {
                return Err(self.fail(format!("Undefined option: `{}'", option.qualified_key())));
            }
            trace!("Applied option {}", option.qualified_key());
        }
        Ok(())
    }

    pub fn set_passphrase(&mut self, passphrase: &str) -> Result<()> {
        self.expect_phase(&[Phase::Configured], "set_passphrase")?;
        if passphrase.is_empty() {
            return Err(self.fail("Empty passphrase is unacceptable"));
        }
        self.passphrase = Some(passphrase.to_string());
        Ok(())
    }

    pub fn set_bytes_per_block(&mut self, bytes: usize) -> Result<()> {
        self.expect_phase(&[Phase::Created, Phase::Configured], "set_bytes_per_block")?;
        self.bytes_per_block = bytes;
        Ok(())
    }

    pub fn set_bytes_in_last_block(&mut self, bytes: usize) -> Result<()> {
        self.expect_phase(
            &[Phase::Created, Phase::Configured],
            "set_bytes_in_last_block",
        )?;
        self.bytes_in_last_block = Some(bytes);
        Ok(())
    }

    // --- Sink binding ---

    /// Binds the handle to a newly created (or truncated) file.
    pub fn open_filename(&mut self, path: &Path) -> Result<()> {
        self.expect_phase(&[Phase::Configured], "open_filename")?;
        let file = File::create(path)
            .map_err(|e| self.fail(format!("Failed to open '{}': {}", path.display(), e)))?;
        let last_block = self.file_last_block(&file, false);
        self.skip_file = file_id(&file);
        self.bind(Destination::File(file), last_block)
    }

    /// Binds the handle to a duplicate of an open descriptor. The caller's
    /// descriptor stays open after the archive is closed.
    #[cfg(unix)]
    pub fn open_fd(&mut self, fd: std::os::fd::BorrowedFd<'_>) -> Result<()> {
        use std::os::fd::AsRawFd;

        self.expect_phase(&[Phase::Configured], "open_fd")?;
        let is_stdout = fd.as_raw_fd() == 1;
        let owned = fd
            .try_clone_to_owned()
            .map_err(|e| self.fail(format!("Failed to duplicate descriptor: {}", e)))?;
        let file = File::from(owned);
        let last_block = self.file_last_block(&file, is_stdout);
        self.skip_file = file_id(&file);
        self.bind(Destination::File(file), last_block)
    }

    /// Binds the handle to user callbacks. Without an explicit
    /// `set_bytes_in_last_block`, the final block is padded to a full block.
    pub fn open_callbacks(&mut self, callbacks: Box<dyn WriteCallbacks + 'a>) -> Result<()> {
        self.expect_phase(&[Phase::Configured], "open_callbacks")?;
        let last_block = self.bytes_in_last_block.unwrap_or(self.bytes_per_block);
        self.bind(Destination::Callbacks(callbacks), last_block)
    }

    /// Devices, FIFOs and standard output get full-block padding unless
    /// told otherwise; regular files are not padded.
    fn file_last_block(&self, file: &File, is_stdout: bool) -> usize {
        if let Some(bytes) = self.bytes_in_last_block {
            return bytes;
        }
        if is_stdout {
            return self.bytes_per_block;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if let Ok(metadata) = file.metadata() {
                let ft = metadata.file_type();
                if ft.is_char_device() || ft.is_block_device() || ft.is_fifo() {
                    return self.bytes_per_block;
                }
            }
        }
        #[cfg(not(unix))]
        let _ = file;
        1
    }

    fn bind(&mut self, destination: Destination<'a>, bytes_in_last_block: usize) -> Result<()> {
        let encoder = self.build_encoder()?;
        let blocks = BlockWriter::open(destination, self.bytes_per_block, bytes_in_last_block)
            .map_err(|e| self.fail_io(e))?;
        let filter = self.filter.unwrap_or(FilterCode::None);
        let output = FilterWriter::new(filter, self.filter_settings.level, blocks)
            .map_err(|e| self.fail_io(e))?;
        self.encoder = Some(encoder);
        self.output = Some(output);
        self.phase = Phase::SinkBound;
        debug!(
            "Sink bound (block size {}, last block {})",
            self.bytes_per_block, bytes_in_last_block
        );
        Ok(())
    }

    fn build_encoder(&mut self) -> Result<Box<dyn EntryEncoder>> {
        let format = self
            .format
            .ok_or_else(|| self.fail("No format has been set"))?;
        Ok(match format {
            FormatCode::CpioOdc => Box::new(CpioEncoder::new(CpioFlavor::Odc)),
            FormatCode::CpioNewc => Box::new(CpioEncoder::new(CpioFlavor::Newc)),
            FormatCode::TarUstar => Box::new(TarEncoder::new(TarFlavor::Ustar)),
            FormatCode::TarGnu => Box::new(TarEncoder::new(TarFlavor::Gnu)),
            FormatCode::TarPaxInterchange | FormatCode::TarPaxRestricted => {
                Box::new(TarEncoder::new(TarFlavor::Pax))
            }
            FormatCode::Zip => {
                if self.zip.encryption.is_some() && self.passphrase.is_none() {
                    return Err(self.fail("Encryption needs passphrase"));
                }
                Box::new(ZipEncoder::new(self.zip.clone(), self.passphrase.clone()))
            }
        })
    }

    // --- Entries ---

    /// Writes the header for `entry`, completing the previous entry first.
    pub fn write_header(&mut self, entry: &RawEntry) -> Result<()> {
        self.expect_phase(&[Phase::SinkBound, Phase::Writing], "write_header")?;
        let result = match (self.encoder.as_mut(), self.output.as_mut()) {
            (Some(encoder), Some(output)) => {
                let previous = if self.phase == Phase::Writing {
                    encoder.finish_entry(output)
                } else {
                    Ok(())
                };
                previous.and_then(|()| encoder.write_header(output, entry))
            }
            _ => Err(io::Error::new(io::ErrorKind::NotConnected, "No sink bound")),
        };
        result.map_err(|e| self.fail_io(e))?;
        self.phase = Phase::Writing;
        Ok(())
    }

    /// Writes payload for the current entry and returns the number of bytes
    /// accepted. Zero for a non-empty `data` means the entry is full.
    pub fn write_data(&mut self, data: &[u8]) -> Result<usize> {
        self.expect_phase(&[Phase::Writing], "write_data")?;
        let result = match (self.encoder.as_mut(), self.output.as_mut()) {
            (Some(encoder), Some(output)) => encoder.write_data(output, data),
            _ => Err(io::Error::new(io::ErrorKind::NotConnected, "No sink bound")),
        };
        let written = result.map_err(|e| self.fail_io(e))?;
        if written == 0 && !data.is_empty() {
            self.error = Some("Entry payload exceeds the size recorded in its header".into());
        }
        Ok(written)
    }

    // --- Teardown ---

    /// Finishes the archive and closes the sink. Only the first call does
    /// any work.
    pub fn close(&mut self) -> Result<()> {
        match self.phase {
            Phase::Closed => return Ok(()),
            Phase::Freed => return Err(self.fail("close called on a freed handle")),
            _ => {}
        }
        let was_writing = self.phase == Phase::Writing;
        self.phase = Phase::Closed;

        let (Some(mut encoder), Some(mut output)) = (self.encoder.take(), self.output.take())
        else {
            debug!("Closed archive handle without a bound sink");
            return Ok(());
        };

        let result = (|| -> io::Result<u64> {
            if was_writing {
                encoder.finish_entry(&mut output)?;
            }
            encoder.finish(&mut output)?;
            output.finish()?.finish()
        })();
        let written = result.map_err(|e| self.fail_io(e))?;
        debug!("Archive closed ({} bytes)", written);
        Ok(())
    }

    /// Closes the archive if needed and releases the handle.
    pub fn free(mut self) -> Result<()> {
        let result = self.close();
        self.phase = Phase::Freed;
        result
    }

    fn expect_phase(&mut self, allowed: &[Phase], operation: &str) -> Result<()> {
        if allowed.contains(&self.phase) {
            return Ok(());
        }
        Err(self.fail(format!(
            "{}: invalid call in phase {:?}",
            operation, self.phase
        )))
    }

    fn fail(&mut self, message: impl Into<String>) -> ArchiveError {
        let message = message.into();
        self.error = Some(message.clone());
        ArchiveError::archive(message)
    }

    fn fail_io(&mut self, err: io::Error) -> ArchiveError {
        self.fail(err.to_string())
    }
}

#[cfg(unix)]
fn file_id(file: &File) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    file.metadata()
        .ok()
        .filter(|m| m.is_file())
        .map(|m| (m.dev(), m.ino()))
}

#[cfg(not(unix))]
fn file_id(_file: &File) -> Option<(u64, u64)> {
    None
}

impl Drop for ArchiveWriter<'_> {
    fn drop(&mut self) {
        if self.phase == Phase::Freed {
            return;
        }
        if let Err(e) = self.close() {
            warn!("Failed to close archive during cleanup: {}", e);
        }
        self.phase = Phase::Freed;
    }
}
