//! # arcwrite Output Sinks (`common::archive::sink`)
//!
//! File: cli/src/common/archive/sink.rs
//!
//! ## Overview
//!
//! The sink is the destination consuming the finished archive byte stream.
//! Three kinds exist: a named file, an already open file descriptor, and a
//! set of caller-supplied callbacks (`WriteCallbacks`).
//!
//! ## Architecture
//!
//! All sinks sit behind `BlockWriter`, which re-frames the byte stream into
//! fixed-size blocks:
//!
//! - every block handed to the destination is exactly `bytes_per_block`
//!   long, except the final one;
//! - on `finish()`, the final partial block is zero-padded up to a multiple of
//!   `bytes_in_last_block` (a value of 1 disables padding), then the
//!   destination is closed.
//!
//! Callback destinations receive each block as a slice of exactly the block
//! length. A callback may accept fewer bytes than offered; the remainder is
//! offered again. Accepting zero bytes is fatal.
//!
use std::fs::File;
use std::io::{self, Write};
use tracing::trace;

/// User-supplied destination for archive bytes.
///
/// Only `write` is required. `open` runs once when the sink is bound and
/// `close` once when the archive is closed.
pub trait WriteCallbacks {
    fn open(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Consumes a prefix of `block` and reports how many bytes were taken.
    fn write(&mut self, block: &[u8]) -> io::Result<usize>;

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

type OpenCloseFn<'a> = Box<dyn FnMut() -> io::Result<()> + 'a>;

/// Adapts closures to [`WriteCallbacks`].
///
/// ```rust
/// use arcwrite::FnCallbacks;
///
/// let mut chunks: Vec<Vec<u8>> = Vec::new();
/// let callbacks = FnCallbacks::new(|block: &[u8]| {
///     chunks.push(block.to_vec());
///     Ok(block.len())
/// })
/// .on_close(|| Ok(()));
/// # drop(callbacks);
/// ```
pub struct FnCallbacks<'a> {
    write: Box<dyn FnMut(&[u8]) -> io::Result<usize> + 'a>,
    open: Option<OpenCloseFn<'a>>,
    close: Option<OpenCloseFn<'a>>,
}

impl<'a> FnCallbacks<'a> {
    pub fn new(write: impl FnMut(&[u8]) -> io::Result<usize> + 'a) -> Self {
        FnCallbacks {
            write: Box::new(write),
            open: None,
            close: None,
        }
    }

    pub fn on_open(mut self, open: impl FnMut() -> io::Result<()> + 'a) -> Self {
        self.open = Some(Box::new(open));
        self
    }

    pub fn on_close(mut self, close: impl FnMut() -> io::Result<()> + 'a) -> Self {
        self.close = Some(Box::new(close));
        self
    }
}

impl WriteCallbacks for FnCallbacks<'_> {
    fn open(&mut self) -> io::Result<()> {
        match self.open.as_mut() {
            Some(open) => open(),
            None => Ok(()),
        }
    }

    fn write(&mut self, block: &[u8]) -> io::Result<usize> {
        (self.write)(block)
    }

    fn close(&mut self) -> io::Result<()> {
        match self.close.as_mut() {
            Some(close) => close(),
            None => Ok(()),
        }
    }
}

/// Where finished blocks go.
pub enum Destination<'a> {
    /// A file opened by name or duplicated from a descriptor.
    File(File),
    Callbacks(Box<dyn WriteCallbacks + 'a>),
}

impl Destination<'_> {
    fn open(&mut self) -> io::Result<()> {
        match self {
            Destination::File(_) => Ok(()),
            Destination::Callbacks(callbacks) => callbacks.open(),
        }
    }

    fn write_block(&mut self, block: &[u8]) -> io::Result<()> {
        match self {
            Destination::File(file) => file.write_all(block),
            Destination::Callbacks(callbacks) => {
                let mut rest = block;
                while !rest.is_empty() {
                    match callbacks.write(rest)? {
                        0 => {
                            return Err(io::Error::new(
                                io::ErrorKind::WriteZero,
                                "write callback accepted no bytes",
                            ))
                        }
                        n => rest = &rest[n.min(rest.len())..],
                    }
                }
                Ok(())
            }
        }
    }

    fn close(&mut self) -> io::Result<()> {
        match self {
            Destination::File(file) => file.flush(),
            Destination::Callbacks(callbacks) => callbacks.close(),
        }
    }
}

/// Re-frames a byte stream into fixed-size blocks for a [`Destination`].
pub struct BlockWriter<'a> {
    destination: Destination<'a>,
    block: Vec<u8>,
    bytes_per_block: usize,
    bytes_in_last_block: usize,
    written: u64,
}

impl<'a> BlockWriter<'a> {
    /// Opens `destination` and prepares block framing. Zero sizes are
    /// treated as 1.
    pub fn open(
        mut destination: Destination<'a>,
        bytes_per_block: usize,
        bytes_in_last_block: usize,
    ) -> io::Result<Self> {
        destination.open()?;
        let bytes_per_block = bytes_per_block.max(1);
        Ok(BlockWriter {
            destination,
            block: Vec::with_capacity(bytes_per_block),
            bytes_per_block,
            bytes_in_last_block: bytes_in_last_block.max(1),
            written: 0,
        })
    }

    /// Total bytes handed to the destination so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Pads and emits the final block, then closes the destination.
    pub fn finish(mut self) -> io::Result<u64> {
        if !self.block.is_empty() {
            let unit = self.bytes_in_last_block;
            let padded = self.block.len().div_ceil(unit) * unit;
            self.block.resize(padded.min(self.bytes_per_block), 0);
            self.emit_block()?;
        }
        self.destination.close()?;
        trace!("Sink closed after {} bytes", self.written);
        Ok(self.written)
    }

    fn emit_block(&mut self) -> io::Result<()> {
        self.destination.write_block(&self.block)?;
        self.written += self.block.len() as u64;
        self.block.clear();
        Ok(())
    }
}

impl Write for BlockWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rest = buf;
        while !rest.is_empty() {
            let take = (self.bytes_per_block - self.block.len()).min(rest.len());
            self.block.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.block.len() == self.bytes_per_block {
                self.emit_block()?;
            }
        }
        Ok(buf.len())
    }

    /// Blocks are only emitted once full; partial blocks wait for `finish()`.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recording(blocks: &RefCell<Vec<Vec<u8>>>) -> Destination<'_> {
        Destination::Callbacks(Box::new(FnCallbacks::new(move |block: &[u8]| {
            blocks.borrow_mut().push(block.to_vec());
            Ok(block.len())
        })))
    }

    #[test]
    fn test_blocks_are_fixed_size_without_padding() -> io::Result<()> {
        let blocks = RefCell::new(Vec::new());
        let mut writer = BlockWriter::open(recording(&blocks), 4, 1)?;
        writer.write_all(b"abcdefghij")?;
        assert_eq!(writer.finish()?, 10);
        assert_eq!(
            *blocks.borrow(),
            vec![b"abcd".to_vec(), b"efgh".to_vec(), b"ij".to_vec()]
        );
        Ok(())
    }

    #[test]
    fn test_last_block_padding() -> io::Result<()> {
        let blocks = RefCell::new(Vec::new());
        let mut writer = BlockWriter::open(recording(&blocks), 8, 8)?;
        writer.write_all(b"abc")?;
        assert_eq!(writer.finish()?, 8);
        assert_eq!(blocks.borrow()[0], b"abc\0\0\0\0\0".to_vec());

        let blocks = RefCell::new(Vec::new());
        let mut writer = BlockWriter::open(recording(&blocks), 8, 2)?;
        writer.write_all(b"abc")?;
        assert_eq!(writer.finish()?, 4);
        Ok(())
    }

    #[test]
    fn test_open_and_close_hooks_run_once() -> io::Result<()> {
        let events = RefCell::new(Vec::new());
        let callbacks = FnCallbacks::new(|block: &[u8]| Ok(block.len()))
            .on_open(|| {
                events.borrow_mut().push("open");
                Ok(())
            })
            .on_close(|| {
                events.borrow_mut().push("close");
                Ok(())
            });
        let writer = BlockWriter::open(Destination::Callbacks(Box::new(callbacks)), 16, 1)?;
        writer.finish()?;
        assert_eq!(*events.borrow(), vec!["open", "close"]);
        Ok(())
    }

    #[test]
    fn test_partial_callback_writes_are_continued() -> io::Result<()> {
        let out = RefCell::new(Vec::new());
        let callbacks = FnCallbacks::new(|block: &[u8]| {
            // Accept at most three bytes per call.
            let n = block.len().min(3);
            out.borrow_mut().extend_from_slice(&block[..n]);
            Ok(n)
        });
        let mut writer = BlockWriter::open(Destination::Callbacks(Box::new(callbacks)), 8, 1)?;
        writer.write_all(b"0123456789")?;
        writer.finish()?;
        assert_eq!(*out.borrow(), b"0123456789".to_vec());
        Ok(())
    }

    #[test]
    fn test_zero_length_callback_write_fails() -> io::Result<()> {
        let callbacks = FnCallbacks::new(|_block: &[u8]| Ok(0));
        let mut writer = BlockWriter::open(Destination::Callbacks(Box::new(callbacks)), 4, 1)?;
        let err = writer.write_all(b"abcd").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
        Ok(())
    }
}
