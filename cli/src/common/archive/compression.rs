//! # arcwrite Compression Filters (`common::archive::compression`)
//!
//! File: cli/src/common/archive/compression.rs
//!
//! ## Overview
//!
//! A filter is a compression transform chained onto the raw archive byte
//! stream. `FilterWriter` wraps the block writer of the bound sink and is the
//! `Write` target every format codec emits into.
//!
//! ## Architecture
//!
//! - **gzip**: `flate2::write::GzEncoder`. The gzip header carries mtime 0, so
//!   identical input produces identical output.
//! - **bzip2**: `bzip2::write::BzEncoder`.
//! - **zstd**: `zstd::stream::write::Encoder`.
//!
//! `finish()` flushes the compressor trailer and hands back the inner writer,
//! which the archive handle then pads and closes.
//!
use crate::common::archive::format::FilterCode;
use std::io::{self, Write};

const DEFAULT_GZIP_LEVEL: u32 = 6;
const DEFAULT_BZIP2_LEVEL: u32 = 9;
const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// The compression stage in front of the sink.
pub enum FilterWriter<W: Write> {
    Identity(W),
    Gzip(flate2::write::GzEncoder<W>),
    Bzip2(bzip2::write::BzEncoder<W>),
    Zstd(zstd::stream::write::Encoder<'static, W>),
}

impl<W: Write> FilterWriter<W> {
    /// Builds the stage for `filter`; `level` falls back to each
    /// compressor's usual default.
    pub fn new(filter: FilterCode, level: Option<i64>, inner: W) -> io::Result<Self> {
        Ok(match filter {
            FilterCode::None => FilterWriter::Identity(inner),
            FilterCode::Gzip => {
                let level = level.map_or(DEFAULT_GZIP_LEVEL, |l| l as u32);
                FilterWriter::Gzip(flate2::write::GzEncoder::new(
                    inner,
                    flate2::Compression::new(level),
                ))
            }
            FilterCode::Bzip2 => {
                let level = level.map_or(DEFAULT_BZIP2_LEVEL, |l| l as u32);
                FilterWriter::Bzip2(bzip2::write::BzEncoder::new(
                    inner,
                    bzip2::Compression::new(level),
                ))
            }
            FilterCode::Zstd => {
                let level = level.map_or(DEFAULT_ZSTD_LEVEL, |l| l as i32);
                FilterWriter::Zstd(zstd::stream::write::Encoder::new(inner, level)?)
            }
        })
    }

    /// Writes the compressor trailer and returns the inner writer.
    pub fn finish(self) -> io::Result<W> {
        match self {
            FilterWriter::Identity(inner) => Ok(inner),
            FilterWriter::Gzip(encoder) => encoder.finish(),
            FilterWriter::Bzip2(encoder) => encoder.finish(),
            FilterWriter::Zstd(encoder) => encoder.finish(),
        }
    }
}

impl<W: Write> Write for FilterWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FilterWriter::Identity(inner) => inner.write(buf),
            FilterWriter::Gzip(encoder) => encoder.write(buf),
            FilterWriter::Bzip2(encoder) => encoder.write(buf),
            FilterWriter::Zstd(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FilterWriter::Identity(inner) => inner.flush(),
            FilterWriter::Gzip(encoder) => encoder.flush(),
            FilterWriter::Bzip2(encoder) => encoder.flush(),
            FilterWriter::Zstd(encoder) => encoder.flush(),
        }
    }
}
