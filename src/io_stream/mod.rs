//! Stream adapters that put an [`Engine`](crate::codec::Engine) behind a
//! sequential byte-stream interface.
//!
//! # Direction
//! [`DeflaterStream`] is write-only: bytes written to it are fed to the
//! engine and the engine's output is drained to the wrapped sink.
//! [`InflaterStream`] is the mirror: reads pull bytes from the wrapped
//! source through the engine.  Operations of the other direction, seeking
//! and length changes fail with
//! [`Error::OperationNotSupported`](crate::Error::OperationNotSupported).
//!
//! # Memory
//! An adapter holds one fixed buffer of `buffer_size` bytes on top of what
//! the engine itself retains, however much data passes through it.
//!
//! # Teardown
//! `close()` is idempotent.  The first call finishes the stream (writer
//! side) and then, if the adapter owns the wrapped stream, closes it, even
//! when finishing failed.  Dropping an adapter that was never closed runs
//! the same teardown.

mod deflater;
mod inflater;

pub use deflater::{DeflaterStream, DeflaterStreamBuilder};
pub use inflater::{InflaterStream, InflaterStreamBuilder};

use std::io::{self, Read, SeekFrom, Write};

use crate::error::{Error, Result};

/// Smallest internal buffer an adapter accepts; an engine needs room to make
/// progress on every step.
pub const MIN_BUFFER_SIZE:     usize = 512;
/// Default internal buffer: 4 KiB.
pub const DEFAULT_BUFFER_SIZE: usize = 4 * 1024;

// ── ByteStream ───────────────────────────────────────────────────────────────

/// The sink or source an adapter wraps.
///
/// Only the capability queries are required; every operation a stream does
/// not support fails with `OperationNotSupported` by default.
pub trait ByteStream {
    fn can_read(&self) -> bool;
    fn can_write(&self) -> bool;
    fn can_seek(&self) -> bool { false }

    /// Read up to `buf.len()` bytes; `Ok(0)` is end of data.
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize> {
        Err(Error::OperationNotSupported("read"))
    }

    /// Write all of `buf`.
    fn write(&mut self, _buf: &[u8]) -> Result<()> {
        Err(Error::OperationNotSupported("write"))
    }

    fn flush(&mut self) -> Result<()> { Ok(()) }

    fn seek(&mut self, _pos: SeekFrom) -> Result<u64> {
        Err(Error::OperationNotSupported("seek"))
    }

    fn set_length(&mut self, _len: u64) -> Result<()> {
        Err(Error::OperationNotSupported("set_length"))
    }

    /// Total length, when the stream knows it.
    fn length(&self) -> Option<u64> { None }

    /// Current position, when the stream tracks it.
    fn position(&self) -> Option<u64> { None }

    /// Release the stream.  Called at most once by an owning adapter, which
    /// then drops it.
    fn close(&mut self) -> Result<()> { Ok(()) }
}

impl<S: ByteStream + ?Sized> ByteStream for Box<S> {
    fn can_read(&self) -> bool { (**self).can_read() }
    fn can_write(&self) -> bool { (**self).can_write() }
    fn can_seek(&self) -> bool { (**self).can_seek() }
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> { (**self).read(buf) }
    fn write(&mut self, buf: &[u8]) -> Result<()> { (**self).write(buf) }
    fn flush(&mut self) -> Result<()> { (**self).flush() }
    fn seek(&mut self, pos: SeekFrom) -> Result<u64> { (**self).seek(pos) }
    fn set_length(&mut self, len: u64) -> Result<()> { (**self).set_length(len) }
    fn length(&self) -> Option<u64> { (**self).length() }
    fn position(&self) -> Option<u64> { (**self).position() }
    fn close(&mut self) -> Result<()> { (**self).close() }
}

// ── Sink / Source ────────────────────────────────────────────────────────────

/// Write-only [`ByteStream`] over any [`io::Write`].
#[derive(Debug)]
pub struct Sink<W: Write> {
    inner:    W,
    position: u64,
}

impl<W: Write> Sink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    pub fn get_ref(&self) -> &W { &self.inner }

    pub fn get_mut(&mut self) -> &mut W { &mut self.inner }

    pub fn into_inner(self) -> W { self.inner }
}

impl<W: Write> ByteStream for Sink<W> {
    fn can_read(&self) -> bool { false }
    fn can_write(&self) -> bool { true }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.inner.write_all(buf).map_err(from_io)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(from_io)
    }

    fn position(&self) -> Option<u64> { Some(self.position) }

    fn close(&mut self) -> Result<()> {
        self.flush()
    }
}

/// Read-only [`ByteStream`] over any [`io::Read`].
#[derive(Debug)]
pub struct Source<R: Read> {
    inner:    R,
    position: u64,
}

impl<R: Read> Source<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    pub fn get_ref(&self) -> &R { &self.inner }

    pub fn get_mut(&mut self) -> &mut R { &mut self.inner }

    pub fn into_inner(self) -> R { self.inner }
}

impl<R: Read> ByteStream for Source<R> {
    fn can_read(&self) -> bool { true }
    fn can_write(&self) -> bool { false }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = loop {
            match self.inner.read(buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(from_io(e)),
            }
        };
        self.position += n as u64;
        Ok(n)
    }

    fn position(&self) -> Option<u64> { Some(self.position) }
}

// ── StreamOptions ────────────────────────────────────────────────────────────

/// Construction-time configuration shared by both adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    /// Internal buffer size; at least [`MIN_BUFFER_SIZE`].
    pub buffer_size: usize,
    /// Whether closing the adapter also closes the wrapped stream.
    pub owns_stream: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            owns_stream: true,
        }
    }
}

impl StreamOptions {
    pub(crate) fn check(&self) -> Result<()> {
        if self.buffer_size < MIN_BUFFER_SIZE {
            return Err(Error::OutOfRange {
                name:  "buffer_size",
                value: self.buffer_size as i64,
                min:   MIN_BUFFER_SIZE as i64,
                max:   i32::MAX as i64,
            });
        }
        Ok(())
    }
}

// ── copy ─────────────────────────────────────────────────────────────────────

/// Pump `source` into `sink` through `buffer` until end of data.
/// Returns the number of bytes copied.  The sink is flushed at the end.
pub fn copy<R: Read + ?Sized, W: Write + ?Sized>(
    source: &mut R,
    sink:   &mut W,
    buffer: &mut [u8],
) -> Result<u64> {
    if buffer.is_empty() {
        return Err(Error::InvalidArgument("copy buffer must not be empty".into()));
    }
    let mut total = 0u64;
    loop {
        let n = match source.read(buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(from_io(e)),
        };
        sink.write_all(&buffer[..n]).map_err(from_io)?;
        total += n as u64;
    }
    sink.flush().map_err(from_io)?;
    Ok(total)
}

/// Unwrap an error that crossed a `std::io` boundary back into the crate
/// taxonomy.
pub(crate) fn from_io(e: io::Error) -> Error {
    if e.get_ref().map_or(true, |inner| !inner.is::<Error>()) {
        return Error::Io(e);
    }
    match e.into_inner().map(|inner| inner.downcast::<Error>()) {
        Some(Ok(inner))  => *inner,
        Some(Err(other)) => Error::Io(io::Error::new(io::ErrorKind::Other, other)),
        None             => Error::InvalidState("failed without an error payload"),
    }
}
