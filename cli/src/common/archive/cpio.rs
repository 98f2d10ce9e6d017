//! # arcwrite CPIO Encoder (`common::archive::cpio`)
//!
//! File: cli/src/common/archive/cpio.rs
//!
//! Writes the two portable cpio variants:
//!
//! - **newc** (SVR4, magic `070701`): hexadecimal ASCII header, name and
//!   payload each padded to 4 bytes.
//! - **odc** (POSIX.1, magic `070707`): octal ASCII header, no padding.
//!
//! Symlink targets are stored as the entry payload and written together with
//! the header. Inode numbers are assigned sequentially so output does not
//! depend on the source filesystem. The archive ends with a `TRAILER!!!`
//! entry.
//!
use crate::common::archive::{path_bytes, write_zeros, EntryBudget, EntryEncoder};
use crate::common::fs::entry::{FileType, RawEntry};
use std::io::{self, Write};

const TRAILER: &[u8] = b"TRAILER!!!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpioFlavor {
    Newc,
    Odc,
}

/// Header fields common to both variants.
struct CpioHeader<'n> {
    ino: u64,
    mode: u64,
    uid: u64,
    gid: u64,
    nlink: u64,
    mtime: u64,
    size: u64,
    rdev_major: u64,
    rdev_minor: u64,
    name: &'n [u8],
}

pub(crate) struct CpioEncoder {
    flavor: CpioFlavor,
    next_ino: u64,
    budget: EntryBudget,
}

impl CpioEncoder {
    pub(crate) fn new(flavor: CpioFlavor) -> Self {
        CpioEncoder {
            flavor,
            next_ino: 1,
            budget: EntryBudget::default(),
        }
    }

    fn padding(&self, len: u64) -> u64 {
        match self.flavor {
            CpioFlavor::Newc => (4 - len % 4) % 4,
            CpioFlavor::Odc => 0,
        }
    }

    fn write_cpio_header(&self, out: &mut dyn Write, header: &CpioHeader<'_>) -> io::Result<()> {
        let namesize = header.name.len() as u64 + 1;
        let mut text = String::with_capacity(110);
        match self.flavor {
            CpioFlavor::Newc => {
                text.push_str("070701");
                for value in [
                    header.ino,
                    header.mode,
                    header.uid,
                    header.gid,
                    header.nlink,
                    header.mtime,
                    header.size,
                    0, // devmajor
                    0, // devminor
                    header.rdev_major,
                    header.rdev_minor,
                    namesize,
                    0, // check
                ] {
                    text.push_str(&field(value, 8, 16)?);
                }
            }
            CpioFlavor::Odc => {
                text.push_str("070707");
                let rdev = ((header.rdev_major & 0xff) << 8) | (header.rdev_minor & 0xff);
                for (value, width) in [
                    (0, 6), // dev
                    (header.ino, 6),
                    (header.mode, 6),
                    (header.uid, 6),
                    (header.gid, 6),
                    (header.nlink, 6),
                    (rdev, 6),
                    (header.mtime, 11),
                    (namesize, 6),
                    (header.size, 11),
                ] {
                    text.push_str(&field(value, width, 8)?);
                }
            }
        }
        out.write_all(text.as_bytes())?;
        out.write_all(header.name)?;
        out.write_all(&[0])?;
        write_zeros(out, self.padding(text.len() as u64 + namesize))
    }
}

/// Formats `value` as a zero-padded hex (radix 16) or octal (radix 8) field.
fn field(value: u64, width: usize, radix: u32) -> io::Result<String> {
    let text = match radix {
        16 => format!("{:0width$x}", value, width = width),
        _ => format!("{:0width$o}", value, width = width),
    };
    if text.len() > width {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Value {} does not fit in a {}-digit cpio header field", value, width),
        ));
    }
    Ok(text)
}

impl EntryEncoder for CpioEncoder {
    fn write_header(&mut self, out: &mut dyn Write, entry: &RawEntry) -> io::Result<()> {
        let name = path_bytes(entry.pathname());
        let link = entry.symlink_target().map(path_bytes);
        let size = match (entry.file_type(), &link) {
            (FileType::Symlink, Some(target)) => target.len() as u64,
            (FileType::Regular, _) => entry.size(),
            _ => 0,
        };
        let header = CpioHeader {
            ino: self.next_ino,
            mode: u64::from(entry.file_type().mode_bits() | entry.mode()),
            uid: entry.uid(),
            gid: entry.gid(),
            nlink: if entry.file_type() == FileType::Directory { 2 } else { 1 },
            mtime: u64::try_from(entry.mtime()).unwrap_or(0),
            size,
            rdev_major: u64::from(entry.rdev_major()),
            rdev_minor: u64::from(entry.rdev_minor()),
            name: &name,
        };
        self.write_cpio_header(out, &header)?;
        self.next_ino += 1;

        match (entry.file_type(), link) {
            (FileType::Symlink, Some(target)) => {
                out.write_all(&target)?;
                self.budget.start(0, self.padding(size));
            }
            _ => self.budget.start(size, self.padding(size)),
        }
        Ok(())
    }

    fn write_data(&mut self, out: &mut dyn Write, data: &[u8]) -> io::Result<usize> {
        self.budget.accept(out, data)
    }

    fn finish_entry(&mut self, out: &mut dyn Write) -> io::Result<()> {
        self.budget.finish(out)
    }

    fn finish(&mut self, out: &mut dyn Write) -> io::Result<()> {
        let trailer = CpioHeader {
            ino: 0,
            mode: 0,
            uid: 0,
            gid: 0,
            nlink: 1,
            mtime: 0,
            size: 0,
            rdev_major: 0,
            rdev_minor: 0,
            name: TRAILER,
        };
        self.write_cpio_header(out, &trailer)
    }
}
