//! # arcwrite Formats Command
//!
//! File: cli/src/commands/formats.rs
//!
//! Implements `arcwrite formats`: prints the archive formats and compression
//! filters this build can write, with the libarchive codes the library API
//! accepts.
//!
//! ```text
//! Formats:
//!   tar      0x30003  POSIX pax, restricted (pax headers only when needed)
//!   ...
//! Filters:
//!   none     0
//!   gzip     1
//! ```
//!
use anyhow::Result;
use arcwrite::{FilterCode, FormatCode};
use clap::Parser;
use std::fmt::Write as _;

/// Arguments for `arcwrite formats` (none).
#[derive(Parser, Debug)]
pub struct FormatsArgs {}

fn describe(format: FormatCode) -> &'static str {
    match format {
        FormatCode::TarPaxRestricted => "POSIX pax, restricted (pax headers only when needed)",
        FormatCode::TarPaxInterchange => "POSIX pax interchange",
        FormatCode::TarUstar => "POSIX ustar",
        FormatCode::TarGnu => "GNU tar",
        FormatCode::Zip => "zip (deflate, optional ZipCrypto/AES encryption)",
        FormatCode::CpioNewc => "SVR4 cpio (newc)",
        FormatCode::CpioOdc => "POSIX.1 cpio (odc)",
    }
}

fn render() -> String {
    let mut out = String::from("Formats:\n");
    for format in FormatCode::ALL {
        let _ = writeln!(
            out,
            "  {:<8} {:#07x}  {}",
            format.name(),
            format.code(),
            describe(format)
        );
    }
    out.push_str("Filters:\n");
    for filter in FilterCode::ALL {
        let _ = writeln!(out, "  {:<8} {}", filter.name(), filter.code());
    }
    out
}

pub fn handle_formats(_args: FormatsArgs) -> Result<()> {
    print!("{}", render());
    Ok(())
}
