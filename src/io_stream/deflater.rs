//! Compressing adapter: `write` feeds the engine, its output goes to the sink.

use std::io;

use crate::codec::Engine;
use crate::error::{check_segment, Error, Result};

use super::{ByteStream, StreamOptions};

// ── Builder ──────────────────────────────────────────────────────────────────

/// Assembles a [`DeflaterStream`]; every argument is checked in
/// [`build`](DeflaterStreamBuilder::build).
pub struct DeflaterStreamBuilder<S, E> {
    stream:  Option<S>,
    engine:  Option<E>,
    options: StreamOptions,
}

impl<S: ByteStream, E: Engine> DeflaterStreamBuilder<S, E> {
    pub fn new() -> Self {
        Self { stream: None, engine: None, options: StreamOptions::default() }
    }

    pub fn stream(mut self, stream: S) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn engine(mut self, engine: E) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn options(mut self, options: StreamOptions) -> Self {
        self.options = options;
        self
    }

    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.options.buffer_size = buffer_size;
        self
    }

    pub fn owns_stream(mut self, owns_stream: bool) -> Self {
        self.options.owns_stream = owns_stream;
        self
    }

    /// # Errors
    /// - [`Error::NullArgument`] if no stream or no engine was given.
    /// - [`Error::InvalidArgument`] if the stream cannot be written.
    /// - [`Error::OutOfRange`] if the buffer is below
    ///   [`MIN_BUFFER_SIZE`](super::MIN_BUFFER_SIZE).
    pub fn build(self) -> Result<DeflaterStream<S, E>> {
        let stream = self.stream.ok_or(Error::NullArgument("stream"))?;
        if !stream.can_write() {
            return Err(Error::InvalidArgument("stream must support writing".into()));
        }
        let engine = self.engine.ok_or(Error::NullArgument("engine"))?;
        self.options.check()?;

        log::debug!(
            "deflater stream: buffer {} B, owns stream: {}",
            self.options.buffer_size, self.options.owns_stream,
        );
        Ok(DeflaterStream {
            inner:       Some(stream),
            engine,
            buffer:      vec![0u8; self.options.buffer_size],
            owns_stream: self.options.owns_stream,
            finished:    false,
            closed:      false,
        })
    }
}

impl<S: ByteStream, E: Engine> Default for DeflaterStreamBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

// ── DeflaterStream ───────────────────────────────────────────────────────────

/// Write-only stream that compresses through an [`Engine`].
///
/// Output is only complete once [`finish`](Self::finish) has run, either
/// directly or through [`close`](Self::close) / drop.
pub struct DeflaterStream<S: ByteStream, E: Engine = Box<dyn Engine + Send>> {
    /// `None` once an owned stream has been released.
    inner:       Option<S>,
    engine:      E,
    buffer:      Vec<u8>,
    owns_stream: bool,
    finished:    bool,
    closed:      bool,
}

impl<S: ByteStream, E: Engine> DeflaterStream<S, E> {
    pub fn builder() -> DeflaterStreamBuilder<S, E> {
        DeflaterStreamBuilder::new()
    }

    /// Default options: 4 KiB buffer, stream owned.
    pub fn new(stream: S, engine: E) -> Result<Self> {
        Self::with_options(stream, engine, StreamOptions::default())
    }

    pub fn with_options(stream: S, engine: E, options: StreamOptions) -> Result<Self> {
        DeflaterStreamBuilder::new().stream(stream).engine(engine).options(options).build()
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    /// The wrapped stream; `None` after an owned stream was closed.
    pub fn get_ref(&self) -> Option<&S> { self.inner.as_ref() }

    pub fn get_mut(&mut self) -> Option<&mut S> { self.inner.as_mut() }

    pub fn engine(&self) -> &E { &self.engine }

    pub fn owns_stream(&self) -> bool { self.owns_stream }

    pub fn is_finished(&self) -> bool { self.finished }

    pub fn is_closed(&self) -> bool { self.closed }

    /// Uncompressed bytes accepted by the engine.
    pub fn total_in(&self) -> u64 { self.engine.total_in() }

    /// Compressed bytes produced by the engine.
    pub fn total_out(&self) -> u64 { self.engine.total_out() }

    // ── Writing ──────────────────────────────────────────────────────────────

    /// Compress `buf`.  Output produced so far is written to the sink; the
    /// engine may keep some of it back until [`flush`](Self::flush) or
    /// [`finish`](Self::finish).
    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.check_writable()?;
        self.engine.set_input(buf);
        self.deflate()
    }

    /// Write `count` bytes of `buffer` from `offset`.  Nothing is written
    /// unless the whole range is valid.
    pub fn write_range(&mut self, buffer: Option<&[u8]>, offset: i64, count: i64) -> Result<()> {
        let segment = check_segment(buffer, offset, count)?;
        self.write(segment)
    }

    /// Emit everything the engine can produce from the input so far, then
    /// flush the sink.  The stream stays open for more writes.
    pub fn flush(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::InvalidState("closed"));
        }
        if !self.finished {
            self.engine.flush();
            self.deflate()?;
        }
        self.sink()?.flush()
    }

    /// Signal end of input and drain the engine to its end of stream.
    ///
    /// # Errors
    /// [`Error::EngineFailure`] if a drain step produces nothing before the
    /// engine reports finished.  The stream is unusable afterwards.
    pub fn finish(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::InvalidState("closed"));
        }
        if self.finished {
            return Ok(());
        }
        let sink = self.inner.as_mut().ok_or(Error::InvalidState("closed"))?;

        self.engine.finish();
        while !self.engine.is_finished() {
            let n = self.engine.step(&mut self.buffer)?;
            if n == 0 {
                break;
            }
            sink.write(&self.buffer[..n])?;
        }
        if !self.engine.is_finished() {
            return Err(Error::EngineFailure("can't deflate all input".into()));
        }

        self.finished = true;
        log::debug!(
            "deflater stream finished: {} B in, {} B out",
            self.engine.total_in(), self.engine.total_out(),
        );
        sink.flush()
    }

    /// Finish the stream (if not yet finished) and, when the stream is
    /// owned, close and drop it.  Later calls do nothing.
    ///
    /// The owned stream is released even if finishing fails; the finish
    /// error is still returned.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.finish();
        self.closed = true;

        if self.owns_stream {
            if let Some(mut stream) = self.inner.take() {
                let released = stream.close();
                drop(stream);
                log::debug!("deflater stream closed with its owned stream");
                return result.and(released);
            }
        }
        result
    }

    /// Finish the stream and return the wrapped stream without closing it,
    /// whatever the ownership flag says.
    ///
    /// If finishing fails, an owned stream is closed and dropped as in
    /// [`close`](Self::close) and the finish error is returned.
    pub fn into_inner(mut self) -> Result<S> {
        if !self.closed {
            let result = self.finish();
            self.closed = true;
            if let Err(e) = result {
                if self.owns_stream {
                    if let Some(mut stream) = self.inner.take() {
                        if let Err(released) = stream.close() {
                            log::warn!("deflater stream release after failed finish: {released}");
                        }
                    }
                }
                return Err(e);
            }
        }
        self.inner.take().ok_or(Error::InvalidState("closed"))
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn check_writable(&self) -> Result<()> {
        if self.closed {
            return Err(Error::InvalidState("closed"));
        }
        if self.finished {
            return Err(Error::InvalidState("finished"));
        }
        Ok(())
    }

    fn sink(&mut self) -> Result<&mut S> {
        self.inner.as_mut().ok_or(Error::InvalidState("closed"))
    }

    /// Step the engine until it asks for input, draining every chunk.
    fn deflate(&mut self) -> Result<()> {
        let sink = self.inner.as_mut().ok_or(Error::InvalidState("closed"))?;
        while !self.engine.needs_input() {
            let n = self.engine.step(&mut self.buffer)?;
            if n == 0 {
                break;
            }
            sink.write(&self.buffer[..n])?;
        }
        if !self.engine.needs_input() {
            return Err(Error::EngineFailure("engine stopped before consuming all input".into()));
        }
        Ok(())
    }
}

impl<S: ByteStream, E: Engine> Drop for DeflaterStream<S, E> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.close() {
                log::warn!("deflater stream teardown failed: {e}");
            }
        }
    }
}

impl<S: ByteStream, E: Engine> ByteStream for DeflaterStream<S, E> {
    fn can_read(&self) -> bool { false }

    fn can_write(&self) -> bool {
        !self.closed && self.inner.as_ref().map_or(false, |s| s.can_write())
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        DeflaterStream::write(self, buf)
    }

    fn flush(&mut self) -> Result<()> {
        DeflaterStream::flush(self)
    }

    fn length(&self) -> Option<u64> {
        self.inner.as_ref().and_then(|s| s.length())
    }

    fn position(&self) -> Option<u64> {
        self.inner.as_ref().and_then(|s| s.position())
    }

    fn close(&mut self) -> Result<()> {
        DeflaterStream::close(self)
    }
}

impl<S: ByteStream, E: Engine> io::Write for DeflaterStream<S, E> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        DeflaterStream::write(self, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(DeflaterStream::flush(self)?)
    }
}
