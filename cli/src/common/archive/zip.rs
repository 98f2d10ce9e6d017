//! # arcwrite ZIP Encoder (`common::archive::zip`)
//!
//! File: cli/src/common/archive/zip.rs
//!
//! ## Overview
//!
//! Writes zip archives through the `zip` crate. Regular files are deflated
//! (or stored with `zip:compression=store`) and, when encryption is enabled,
//! encrypted with the archive passphrase using either traditional PKWARE
//! encryption or WinZip AES.
//!
//! ## Architecture
//!
//! The central directory at the end of a zip file refers back to local
//! header offsets, so `ZipWriter` needs a seekable target. The archive is
//! assembled in memory and streamed into the filter/sink chain at `finish()`.
//!
//! Directories and symlinks are stored unencrypted. Devices, FIFOs and
//! sockets have no zip representation and are rejected.
//!
use crate::common::archive::options::{ZipEncryption, ZipSettings};
use crate::common::archive::EntryEncoder;
use crate::common::fs::entry::{FileType, RawEntry};
use ::zip::unstable::write::FileOptionsExt;
use ::zip::write::FileOptions;
use ::zip::{AesMode, CompressionMethod, ZipWriter};
use chrono::{Datelike, Timelike};
use std::io::{self, Cursor, Write};
use tracing::trace;

/// Entries at or above this size need zip64 extra fields.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

pub(crate) struct ZipEncoder {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    settings: ZipSettings,
    passphrase: Option<String>,
    /// Whether the current entry accepts payload.
    accepting: bool,
}

impl ZipEncoder {
    pub(crate) fn new(settings: ZipSettings, passphrase: Option<String>) -> Self {
        ZipEncoder {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            settings,
            passphrase,
            accepting: false,
        }
    }
}

fn zip_error(err: ::zip::result::ZipError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

/// Converts a Unix timestamp to a zip (MS-DOS) timestamp. Times outside the
/// representable 1980..2107 range fall back to the zip epoch.
fn dos_time(mtime: i64) -> ::zip::DateTime {
    chrono::DateTime::from_timestamp(mtime, 0)
        .and_then(|t| {
            ::zip::DateTime::from_date_and_time(
                u16::try_from(t.year()).ok()?,
                t.month() as u8,
                t.day() as u8,
                t.hour() as u8,
                t.minute() as u8,
                t.second() as u8,
            )
            .ok()
        })
        .unwrap_or_default()
}

/// Options shared by every entry kind.
fn base_options<'k>(entry: &RawEntry) -> FileOptions<'k, ()> {
    FileOptions::default()
        .unix_permissions(entry.mode())
        .last_modified_time(dos_time(entry.mtime()))
}

/// Options for a regular file, including compression and encryption.
fn file_options<'k>(
    settings: &ZipSettings,
    passphrase: Option<&'k str>,
    entry: &RawEntry,
) -> io::Result<FileOptions<'k, ()>> {
    let mut options = base_options(entry).large_file(entry.size() >= ZIP64_THRESHOLD);
    options = if settings.store {
        options.compression_method(CompressionMethod::Stored)
    } else {
        options
            .compression_method(CompressionMethod::Deflated)
            .compression_level(settings.level)
    };

    match (settings.encryption, passphrase) {
        (None, _) => Ok(options),
        (Some(_), None) => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Encryption needs passphrase",
        )),
        (Some(ZipEncryption::Traditional), Some(pass)) => {
            Ok(options.with_deprecated_encryption(pass.as_bytes()))
        }
        (Some(ZipEncryption::Aes128), Some(pass)) => {
            Ok(options.with_aes_encryption(AesMode::Aes128, pass))
        }
        (Some(ZipEncryption::Aes256), Some(pass)) => {
            Ok(options.with_aes_encryption(AesMode::Aes256, pass))
        }
    }
}

fn entry_name(entry: &RawEntry) -> String {
    entry.pathname().to_string_lossy().replace('\\', "/")
}

impl EntryEncoder for ZipEncoder {
    fn write_header(&mut self, _out: &mut dyn Write, entry: &RawEntry) -> io::Result<()> {
        let name = entry_name(entry);
        self.accepting = false;
        match entry.file_type() {
            FileType::Regular => {
                let options = file_options(&self.settings, self.passphrase.as_deref(), entry)?;
                self.zip.start_file(name, options).map_err(zip_error)?;
                self.accepting = true;
            }
            FileType::Directory => {
                self.zip
                    .add_directory(name, base_options(entry))
                    .map_err(zip_error)?;
            }
            FileType::Symlink => {
                let target = entry
                    .symlink_target()
                    .map(|t| t.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.zip
                    .add_symlink(name, target, base_options(entry))
                    .map_err(zip_error)?;
            }
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("Filetype not supported: {:?}", other),
                ))
            }
        }
        trace!("zip entry started: {}", entry.pathname().display());
        Ok(())
    }

    fn write_data(&mut self, _out: &mut dyn Write, data: &[u8]) -> io::Result<usize> {
        if !self.accepting {
            return Ok(0);
        }
        self.zip.write_all(data)?;
        Ok(data.len())
    }

    fn finish_entry(&mut self, _out: &mut dyn Write) -> io::Result<()> {
        self.accepting = false;
        Ok(())
    }

    fn finish(&mut self, out: &mut dyn Write) -> io::Result<()> {
        let zip = std::mem::replace(&mut self.zip, ZipWriter::new(Cursor::new(Vec::new())));
        let buffer = zip.finish().map_err(zip_error)?.into_inner();
        out.write_all(&buffer)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn regular(name: &str, size: u64) -> RawEntry {
        let mut entry = RawEntry::new(name, FileType::Regular);
        entry.set_size(size);
        entry
    }

    #[test]
    fn test_plain_zip_round_trip() -> io::Result<()> {
        let mut out = Vec::new();
        let mut encoder = ZipEncoder::new(ZipSettings::default(), None);
        encoder.write_header(&mut out, &RawEntry::new("dir", FileType::Directory))?;
        encoder.write_header(&mut out, &regular("dir/a.txt", 5))?;
        assert_eq!(encoder.write_data(&mut out, b"hello")?, 5);
        encoder.finish_entry(&mut out)?;
        encoder.finish(&mut out)?;

        let mut archive = ::zip::ZipArchive::new(Cursor::new(out)).map_err(zip_error)?;
        assert_eq!(archive.len(), 2);
        let mut text = String::new();
        archive
            .by_name("dir/a.txt")
            .map_err(zip_error)?
            .read_to_string(&mut text)?;
        assert_eq!(text, "hello");
        assert!(archive.by_name("dir/").map_err(zip_error)?.is_dir());
        Ok(())
    }

    #[test]
    fn test_encrypted_entry_needs_password() -> io::Result<()> {
        let settings = ZipSettings {
            encryption: Some(ZipEncryption::Traditional),
            ..ZipSettings::default()
        };
        let mut out = Vec::new();
        let mut encoder = ZipEncoder::new(settings, Some("secret".into()));
        encoder.write_header(&mut out, &regular("s.txt", 3))?;
        encoder.write_data(&mut out, b"abc")?;
        encoder.finish(&mut out)?;

        let mut archive = ::zip::ZipArchive::new(Cursor::new(out)).map_err(zip_error)?;
        assert!(archive.by_index(0).is_err());
        let mut text = String::new();
        archive
            .by_index_decrypt(0, b"secret")
            .map_err(zip_error)?
            .read_to_string(&mut text)?;
        assert_eq!(text, "abc");
        Ok(())
    }

    #[test]
    fn test_encryption_without_passphrase_fails() {
        let settings = ZipSettings {
            encryption: Some(ZipEncryption::Aes256),
            ..ZipSettings::default()
        };
        let mut encoder = ZipEncoder::new(settings, None);
        let err = encoder
            .write_header(&mut Vec::<u8>::new(), &regular("x", 1))
            .unwrap_err();
        assert_eq!(err.to_string(), "Encryption needs passphrase");
    }

    #[test]
    fn test_special_files_rejected() {
        let mut encoder = ZipEncoder::new(ZipSettings::default(), None);
        let err = encoder
            .write_header(&mut Vec::<u8>::new(), &RawEntry::new("p", FileType::Fifo))
            .unwrap_err();
        assert!(err.to_string().starts_with("Filetype not supported"));
    }

    #[test]
    fn test_dos_time_clamps() {
        assert_eq!(dos_time(0), ::zip::DateTime::default());
        let t = dos_time(1_700_000_000);
        assert_eq!(t.year(), 2023);
    }
}
