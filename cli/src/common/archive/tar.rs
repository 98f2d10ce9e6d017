//! # arcwrite TAR Encoder (`common::archive::tar`)
//!
//! File: cli/src/common/archive/tar.rs
//!
//! ## Overview
//!
//! This module writes the tar family of formats (ustar, GNU tar, pax) one
//! entry at a time. Header blocks are built with the `tar` crate's `Header`
//! type; framing (payload, 512-byte padding, end-of-archive marker) is
//! written here so payload can be streamed in chunks after the header.
//!
//! ## Architecture
//!
//! - **ustar**: names up to 256 bytes (prefix + name) and link targets up to
//!   100 bytes. Longer values fail the entry.
//! - **GNU tar**: longer names and link targets are carried in
//!   `././@LongLink` records (`L` / `K`) preceding the real header.
//! - **pax**: longer names, link targets and sizes above the octal limit are
//!   carried in an extended header (`x`) preceding the real header.
//!
//! Entry sizes come from the metadata captured when the entry was walked.
//! Payload beyond that size is refused; a short payload is zero-filled.
//!
//! Sockets cannot be represented in any tar flavour and are rejected.
//!
use crate::common::archive::{path_bytes, write_zeros, EntryBudget, EntryEncoder};
use crate::common::fs::entry::{FileType, RawEntry};
use ::tar::{EntryType, Header};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const BLOCK: u64 = 512;
/// Length of the `name` field shared by every header flavour.
const NAME_FIELD: usize = 100;
/// Largest size an 11-digit octal field can hold.
const MAX_OCTAL_SIZE: u64 = 0o77777777777;

/// Which tar dialect to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TarFlavor {
    Ustar,
    Gnu,
    Pax,
}

/// Tar codec.
pub(crate) struct TarEncoder {
    flavor: TarFlavor,
    budget: EntryBudget,
}

impl TarEncoder {
    pub(crate) fn new(flavor: TarFlavor) -> Self {
        TarEncoder {
            flavor,
            budget: EntryBudget::default(),
        }
    }

    fn new_header(&self) -> Header {
        match self.flavor {
            TarFlavor::Gnu => Header::new_gnu(),
            TarFlavor::Ustar | TarFlavor::Pax => Header::new_ustar(),
        }
    }

    /// Sets the name field, falling back to a long-name record when the
    /// flavour supports one.
    fn set_path(
        &self,
        out: &mut dyn Write,
        header: &mut Header,
        path: &Path,
        pax: &mut Vec<(&'static str, Vec<u8>)>,
    ) -> io::Result<()> {
        let err = match header.set_path(path) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        let bytes = path_bytes(path);
        if bytes.len() < NAME_FIELD {
            return Err(err);
        }
        match self.flavor {
            TarFlavor::Ustar => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Pathname too long for ustar: {}", path.display()),
            )),
            TarFlavor::Gnu => {
                write_gnu_long_record(out, EntryType::GNULongName, &bytes)?;
                header.set_path(truncated(&bytes, NAME_FIELD))
            }
            TarFlavor::Pax => {
                pax.push(("path", bytes.to_vec()));
                header.set_path(truncated(&bytes, NAME_FIELD))
            }
        }
    }

    fn set_link_name(
        &self,
        out: &mut dyn Write,
        header: &mut Header,
        target: &Path,
        pax: &mut Vec<(&'static str, Vec<u8>)>,
    ) -> io::Result<()> {
        let err = match header.set_link_name(target) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        let bytes = path_bytes(target);
        if bytes.len() < NAME_FIELD {
            return Err(err);
        }
        match self.flavor {
            TarFlavor::Ustar => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Link target too long for ustar: {}", target.display()),
            )),
            TarFlavor::Gnu => {
                write_gnu_long_record(out, EntryType::GNULongLink, &bytes)?;
                header.set_link_name(truncated(&bytes, NAME_FIELD))
            }
            TarFlavor::Pax => {
                pax.push(("linkpath", bytes.to_vec()));
                header.set_link_name(truncated(&bytes, NAME_FIELD))
            }
        }
    }
}

impl EntryEncoder for TarEncoder {
    fn write_header(&mut self, out: &mut dyn Write, entry: &RawEntry) -> io::Result<()> {
        let entry_type = match entry.file_type() {
            FileType::Regular => EntryType::Regular,
            FileType::Directory => EntryType::Directory,
            FileType::Symlink => EntryType::Symlink,
            FileType::CharDevice => EntryType::Char,
            FileType::BlockDevice => EntryType::Block,
            FileType::Fifo => EntryType::Fifo,
            FileType::Socket => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("{}: tar format cannot archive socket", entry.pathname().display()),
                ))
            }
        };
        let size = if entry.file_type() == FileType::Regular {
            entry.size()
        } else {
            0
        };

        let mut header = self.new_header();
        let mut pax = Vec::new();
        self.set_path(out, &mut header, entry.pathname(), &mut pax)?;
        if let Some(target) = entry.symlink_target() {
            self.set_link_name(out, &mut header, target, &mut pax)?;
        }
        if size > MAX_OCTAL_SIZE {
            match self.flavor {
                TarFlavor::Pax => pax.push(("size", size.to_string().into_bytes())),
                TarFlavor::Gnu => {} // base-256 encoding handles it
                TarFlavor::Ustar => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("File size out of range for ustar: {}", entry.pathname().display()),
                    ))
                }
            }
        }

        header.set_size(size);
        header.set_mode(entry.mode());
        header.set_uid(entry.uid());
        header.set_gid(entry.gid());
        header.set_mtime(u64::try_from(entry.mtime()).unwrap_or(0));
        header.set_entry_type(entry_type);
        if matches!(entry.file_type(), FileType::CharDevice | FileType::BlockDevice) {
            header.set_device_major(entry.rdev_major())?;
            header.set_device_minor(entry.rdev_minor())?;
        }
        header.set_cksum();

        if !pax.is_empty() {
            write_pax_record(out, entry, &pax)?;
        }
        out.write_all(header.as_bytes())?;
        self.budget.start(size, block_padding(size));
        Ok(())
    }

    fn write_data(&mut self, out: &mut dyn Write, data: &[u8]) -> io::Result<usize> {
        self.budget.accept(out, data)
    }

    fn finish_entry(&mut self, out: &mut dyn Write) -> io::Result<()> {
        self.budget.finish(out)
    }

    /// Two zero blocks mark the end of the archive.
    fn finish(&mut self, out: &mut dyn Write) -> io::Result<()> {
        write_zeros(out, 2 * BLOCK)
    }
}

fn block_padding(size: u64) -> u64 {
    (BLOCK - size % BLOCK) % BLOCK
}

/// Longest UTF-8-valid prefix of `bytes` that fits in `max` bytes.
fn truncated(bytes: &[u8], max: usize) -> PathBuf {
    let slice = &bytes[..bytes.len().min(max)];
    let valid = match std::str::from_utf8(slice) {
        Ok(s) => s,
        Err(e) => std::str::from_utf8(&slice[..e.valid_up_to()]).unwrap_or(""),
    };
    PathBuf::from(valid)
}

/// Writes a `././@LongLink` record carrying `value` (NUL-terminated).
fn write_gnu_long_record(out: &mut dyn Write, kind: EntryType, value: &[u8]) -> io::Result<()> {
    let mut header = Header::new_gnu();
    let name = b"././@LongLink";
    if let Some(gnu) = header.as_gnu_mut() {
        gnu.name[..name.len()].copy_from_slice(name);
    }
    header.set_mode(0o644);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    let size = value.len() as u64 + 1;
    header.set_size(size);
    header.set_entry_type(kind);
    header.set_cksum();

    out.write_all(header.as_bytes())?;
    out.write_all(value)?;
    out.write_all(&[0])?;
    write_zeros(out, block_padding(size))
}

/// Encodes one `"<len> key=value\n"` record; `len` counts its own digits.
fn pax_record(key: &str, value: &[u8]) -> Vec<u8> {
    let base = key.len() + value.len() + 3; // ' ', '=', '\n'
    let mut len = base + base.to_string().len();
    if len.to_string().len() != base.to_string().len() {
        len = base + len.to_string().len();
    }
    let mut record = format!("{} {}=", len, key).into_bytes();
    record.extend_from_slice(value);
    record.push(b'\n');
    record
}

fn write_pax_record(
    out: &mut dyn Write,
    entry: &RawEntry,
    records: &[(&'static str, Vec<u8>)],
) -> io::Result<()> {
    let body: Vec<u8> = records
        .iter()
        .flat_map(|(key, value)| pax_record(key, value))
        .collect();

    let base_name = entry
        .pathname()
        .file_name()
        .map(|name| truncated(&path_bytes(Path::new(name)), 80))
        .unwrap_or_default();
    let mut header = Header::new_ustar();
    if header.set_path(Path::new("PaxHeader").join(&base_name)).is_err() {
        header.set_path("PaxHeader/entry")?;
    }
    header.set_mode(0o644);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(u64::try_from(entry.mtime()).unwrap_or(0));
    header.set_size(body.len() as u64);
    header.set_entry_type(EntryType::XHeader);
    header.set_cksum();

    out.write_all(header.as_bytes())?;
    out.write_all(&body)?;
    write_zeros(out, block_padding(body.len() as u64))
}
