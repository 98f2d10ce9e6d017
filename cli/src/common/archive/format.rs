//! # arcwrite Format & Filter Codes (`common::archive::format`)
//!
//! File: cli/src/common/archive/format.rs
//!
//! Numeric codes are the ones libarchive uses, so callers that already speak
//! libarchive codes can pass them through unchanged. `FormatCode` and
//! `FilterCode` are the typed views; `from_code` returns `None` for anything
//! this crate cannot encode.
//!

/// Base code of the cpio family (resolves to newc).
pub const ARCHIVE_FORMAT_CPIO: i32 = 0x10000;
/// POSIX.1 "odc" cpio.
pub const ARCHIVE_FORMAT_CPIO_POSIX: i32 = 0x10001;
/// SVR4 "newc" cpio without checksums.
pub const ARCHIVE_FORMAT_CPIO_SVR4_NOCRC: i32 = 0x10004;
/// Base code of the tar family (resolves to restricted pax).
pub const ARCHIVE_FORMAT_TAR: i32 = 0x30000;
pub const ARCHIVE_FORMAT_TAR_USTAR: i32 = 0x30001;
pub const ARCHIVE_FORMAT_TAR_PAX_INTERCHANGE: i32 = 0x30002;
pub const ARCHIVE_FORMAT_TAR_PAX_RESTRICTED: i32 = 0x30003;
pub const ARCHIVE_FORMAT_TAR_GNUTAR: i32 = 0x30004;
pub const ARCHIVE_FORMAT_ZIP: i32 = 0x50000;

pub const ARCHIVE_FILTER_NONE: i32 = 0;
pub const ARCHIVE_FILTER_GZIP: i32 = 1;
pub const ARCHIVE_FILTER_BZIP2: i32 = 2;
pub const ARCHIVE_FILTER_COMPRESS: i32 = 3;
pub const ARCHIVE_FILTER_PROGRAM: i32 = 4;
pub const ARCHIVE_FILTER_LZMA: i32 = 5;
pub const ARCHIVE_FILTER_XZ: i32 = 6;
pub const ARCHIVE_FILTER_UU: i32 = 7;
pub const ARCHIVE_FILTER_RPM: i32 = 8;
pub const ARCHIVE_FILTER_LZIP: i32 = 9;
pub const ARCHIVE_FILTER_LRZIP: i32 = 10;
pub const ARCHIVE_FILTER_LZOP: i32 = 11;
pub const ARCHIVE_FILTER_GRZIP: i32 = 12;
pub const ARCHIVE_FILTER_LZ4: i32 = 13;
pub const ARCHIVE_FILTER_ZSTD: i32 = 14;

/// Archive container layouts this crate can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatCode {
    CpioOdc,
    CpioNewc,
    TarUstar,
    TarPaxInterchange,
    TarPaxRestricted,
    TarGnu,
    Zip,
}

impl FormatCode {
    pub const ALL: [FormatCode; 7] = [
        FormatCode::TarPaxRestricted,
        FormatCode::TarPaxInterchange,
        FormatCode::TarUstar,
        FormatCode::TarGnu,
        FormatCode::Zip,
        FormatCode::CpioNewc,
        FormatCode::CpioOdc,
    ];

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            ARCHIVE_FORMAT_CPIO | ARCHIVE_FORMAT_CPIO_SVR4_NOCRC => Some(FormatCode::CpioNewc),
            ARCHIVE_FORMAT_CPIO_POSIX => Some(FormatCode::CpioOdc),
            ARCHIVE_FORMAT_TAR | ARCHIVE_FORMAT_TAR_PAX_RESTRICTED => {
                Some(FormatCode::TarPaxRestricted)
            }
            ARCHIVE_FORMAT_TAR_USTAR => Some(FormatCode::TarUstar),
            ARCHIVE_FORMAT_TAR_PAX_INTERCHANGE => Some(FormatCode::TarPaxInterchange),
            ARCHIVE_FORMAT_TAR_GNUTAR => Some(FormatCode::TarGnu),
            ARCHIVE_FORMAT_ZIP => Some(FormatCode::Zip),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            FormatCode::CpioOdc => ARCHIVE_FORMAT_CPIO_POSIX,
            FormatCode::CpioNewc => ARCHIVE_FORMAT_CPIO_SVR4_NOCRC,
            FormatCode::TarUstar => ARCHIVE_FORMAT_TAR_USTAR,
            FormatCode::TarPaxInterchange => ARCHIVE_FORMAT_TAR_PAX_INTERCHANGE,
            FormatCode::TarPaxRestricted => ARCHIVE_FORMAT_TAR_PAX_RESTRICTED,
            FormatCode::TarGnu => ARCHIVE_FORMAT_TAR_GNUTAR,
            FormatCode::Zip => ARCHIVE_FORMAT_ZIP,
        }
    }

    /// Accepts the names used on the command line and in config files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "tar" | "paxr" | "rpax" | "pax-restricted" => Some(FormatCode::TarPaxRestricted),
            "pax" | "posix" => Some(FormatCode::TarPaxInterchange),
            "ustar" => Some(FormatCode::TarUstar),
            "gnutar" | "gnu" => Some(FormatCode::TarGnu),
            "zip" => Some(FormatCode::Zip),
            "cpio" | "newc" => Some(FormatCode::CpioNewc),
            "odc" => Some(FormatCode::CpioOdc),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FormatCode::CpioOdc => "odc",
            FormatCode::CpioNewc => "newc",
            FormatCode::TarUstar => "ustar",
            FormatCode::TarPaxInterchange => "pax",
            FormatCode::TarPaxRestricted => "tar",
            FormatCode::TarGnu => "gnutar",
            FormatCode::Zip => "zip",
        }
    }

    /// Module name that `module:key=value` options address.
    pub fn module(self) -> &'static str {
        match self {
            FormatCode::CpioOdc | FormatCode::CpioNewc => "cpio",
            FormatCode::TarUstar => "ustar",
            FormatCode::TarPaxInterchange | FormatCode::TarPaxRestricted => "pax",
            FormatCode::TarGnu => "gnutar",
            FormatCode::Zip => "zip",
        }
    }
}

/// Compression filters applied to the whole archive byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterCode {
    None,
    Gzip,
    Bzip2,
    Zstd,
}

impl FilterCode {
    pub const ALL: [FilterCode; 4] = [
        FilterCode::None,
        FilterCode::Gzip,
        FilterCode::Bzip2,
        FilterCode::Zstd,
    ];

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            ARCHIVE_FILTER_NONE => Some(FilterCode::None),
            ARCHIVE_FILTER_GZIP => Some(FilterCode::Gzip),
            ARCHIVE_FILTER_BZIP2 => Some(FilterCode::Bzip2),
            ARCHIVE_FILTER_ZSTD => Some(FilterCode::Zstd),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            FilterCode::None => ARCHIVE_FILTER_NONE,
            FilterCode::Gzip => ARCHIVE_FILTER_GZIP,
            FilterCode::Bzip2 => ARCHIVE_FILTER_BZIP2,
            FilterCode::Zstd => ARCHIVE_FILTER_ZSTD,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" => Some(FilterCode::None),
            "gzip" | "gz" => Some(FilterCode::Gzip),
            "bzip2" | "bz2" => Some(FilterCode::Bzip2),
            "zstd" | "zst" => Some(FilterCode::Zstd),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FilterCode::None => "none",
            FilterCode::Gzip => "gzip",
            FilterCode::Bzip2 => "bzip2",
            FilterCode::Zstd => "zstd",
        }
    }
}

/// Name of a libarchive filter code this crate recognises but cannot write.
pub fn unsupported_filter_name(code: i32) -> Option<&'static str> {
    match code {
        ARCHIVE_FILTER_COMPRESS => Some("compress"),
        ARCHIVE_FILTER_PROGRAM => Some("program"),
        ARCHIVE_FILTER_LZMA => Some("lzma"),
        ARCHIVE_FILTER_XZ => Some("xz"),
        ARCHIVE_FILTER_UU => Some("uuencode"),
        ARCHIVE_FILTER_RPM => Some("rpm"),
        ARCHIVE_FILTER_LZIP => Some("lzip"),
        ARCHIVE_FILTER_LRZIP => Some("lrzip"),
        ARCHIVE_FILTER_LZOP => Some("lzop"),
        ARCHIVE_FILTER_GRZIP => Some("grzip"),
        ARCHIVE_FILTER_LZ4 => Some("lz4"),
        _ => None,
    }
}
