//! # Entry Emission (`pipeline::emit`)
//!
//! File: cli/src/pipeline/emit.rs
//!
//! ## Overview
//!
//! Writes one walked entry into the archive: the header first, then the
//! payload.
//!
//! - **Symlinks** are recorded with their target, resolved one level with
//!   `read_link`. The target file itself is never opened, so dangling links
//!   archive fine.
//! - **Regular files** are read in `block_size` chunks and each chunk is
//!   handed to the writer. A non-empty chunk of which the writer accepts zero
//!   bytes fails with `ArchiveError::WriteData`.
//! - **Everything else** (directories, devices, FIFOs, sockets) is
//!   header-only and never opened.
//!
//! The entry size is never set here; the codecs take it from the metadata
//! the walker captured.
//!
use crate::common::archive::writer::ArchiveWriter;
use crate::common::fs::entry::{FileType, RawEntry, SourceEntry};
use crate::core::error::{ArchiveError, Result};
use std::fs::{self, File};
use std::io::{self, Read};
use tracing::{debug, trace};

/// Emits `raw` (the header view of `entry`) and returns the number of
/// payload bytes written, or the length of the symlink target.
pub fn emit(
    writer: &mut ArchiveWriter<'_>,
    entry: &mut SourceEntry,
    raw: &RawEntry,
    block_size: usize,
) -> Result<u64> {
    writer.write_header(raw)?;

    let on_disk_link = entry.file_type() == FileType::Symlink
        && fs::symlink_metadata(entry.source_path())
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);

    match entry.file_type() {
        FileType::Symlink if on_disk_link => {
            let target = fs::read_link(entry.source_path()).map_err(|e| {
                ArchiveError::archive(format!(
                    "Couldn't read link {:?}: {}",
                    entry.source_path(),
                    e
                ))
            })?;
            let written = target.as_os_str().len() as u64;
            debug!("{:?} -> {:?}", entry.archive_path(), target);
            entry.set_symlink_target(target);
            Ok(written)
        }
        FileType::Regular | FileType::Symlink => copy_payload(writer, entry, block_size),
        _ => {
            trace!("Header-only entry {:?}", entry.archive_path());
            Ok(0)
        }
    }
}

fn copy_payload(
    writer: &mut ArchiveWriter<'_>,
    entry: &SourceEntry,
    block_size: usize,
) -> Result<u64> {
    let mut file = File::open(entry.source_path()).map_err(|e| {
        ArchiveError::archive(format!(
            "Failed to open {:?}: {}",
            entry.source_path(),
            e
        ))
    })?;

    let mut buf = vec![0u8; block_size.max(1)];
    let mut total = 0u64;
    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(ArchiveError::archive(format!(
                    "Failed to read {:?}: {}",
                    entry.source_path(),
                    e
                )))
            }
        };
        let written = writer.write_data(&buf[..n])?;
        if written == 0 {
            return Err(ArchiveError::WriteData(
                writer.error_string().unwrap_or_default().to_string(),
            ));
        }
        total += written as u64;
    }
    trace!("Wrote {} bytes for {:?}", total, entry.archive_path());
    Ok(total)
}
