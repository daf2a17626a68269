//! Decompressing adapter: `read` pulls from the source through the engine.

use std::io;

use crate::codec::Engine;
use crate::error::{Error, Result};

use super::{ByteStream, StreamOptions};

// ── Builder ──────────────────────────────────────────────────────────────────

pub struct InflaterStreamBuilder<S, E> {
    stream:  Option<S>,
    engine:  Option<E>,
    options: StreamOptions,
}

impl<S: ByteStream, E: Engine> InflaterStreamBuilder<S, E> {
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

    /// Same checks as the writer side, with `can_read` in place of
    /// `can_write`.
    pub fn build(self) -> Result<InflaterStream<S, E>> {
        let stream = self.stream.ok_or(Error::NullArgument("stream"))?;
        if !stream.can_read() {
            return Err(Error::InvalidArgument("stream must support reading".into()));
        }
        let engine = self.engine.ok_or(Error::NullArgument("engine"))?;
        self.options.check()?;

        log::debug!(
            "inflater stream: buffer {} B, owns stream: {}",
            self.options.buffer_size, self.options.owns_stream,
        );
        Ok(InflaterStream {
            inner:        Some(stream),
            engine,
            buffer:       vec![0u8; self.options.buffer_size],
            owns_stream:  self.options.owns_stream,
            source_ended: false,
            read_any:     false,
            closed:       false,
        })
    }
}

impl<S: ByteStream, E: Engine> Default for InflaterStreamBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

// ── InflaterStream ───────────────────────────────────────────────────────────

/// Read-only stream that decompresses its source through an [`Engine`].
pub struct InflaterStream<S: ByteStream, E: Engine = Box<dyn Engine + Send>> {
    inner:        Option<S>,
    engine:       E,
    buffer:       Vec<u8>,
    owns_stream:  bool,
    /// The source has reported end of data.
    source_ended: bool,
    /// At least one byte came from the source.
    read_any:     bool,
    closed:       bool,
}

impl<S: ByteStream, E: Engine> InflaterStream<S, E> {
    pub fn builder() -> InflaterStreamBuilder<S, E> {
        InflaterStreamBuilder::new()
    }

    pub fn new(stream: S, engine: E) -> Result<Self> {
        Self::with_options(stream, engine, StreamOptions::default())
    }

    pub fn with_options(stream: S, engine: E, options: StreamOptions) -> Result<Self> {
        InflaterStreamBuilder::new().stream(stream).engine(engine).options(options).build()
    }

    pub fn get_ref(&self) -> Option<&S> { self.inner.as_ref() }

    pub fn get_mut(&mut self) -> Option<&mut S> { self.inner.as_mut() }

    pub fn engine(&self) -> &E { &self.engine }

    pub fn owns_stream(&self) -> bool { self.owns_stream }

    pub fn is_closed(&self) -> bool { self.closed }

    /// Compressed bytes consumed by the engine.
    pub fn total_in(&self) -> u64 { self.engine.total_in() }

    /// Decompressed bytes handed out.
    pub fn total_out(&self) -> u64 { self.engine.total_out() }

    /// Fill `buf` with decompressed bytes; `Ok(0)` is end of data.
    ///
    /// An empty source is an empty stream.  A non-empty source that ends
    /// before the engine does fails with [`Error::EngineFailure`].
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.closed {
            return Err(Error::InvalidState("closed"));
        }
        if buf.is_empty() || self.engine.is_finished() {
            return Ok(0);
        }

        loop {
            let before = self.engine.total_in();
            let n = self.engine.step(buf)?;
            if n > 0 {
                return Ok(n);
            }
            if self.engine.is_finished() {
                log::debug!(
                    "inflater stream reached end: {} B in, {} B out",
                    self.engine.total_in(), self.engine.total_out(),
                );
                return Ok(0);
            }
            if !self.engine.needs_input() {
                if self.engine.total_in() > before {
                    continue;
                }
                return Err(Error::EngineFailure("engine made no progress".into()));
            }
            if self.source_ended {
                if !self.read_any {
                    return Ok(0);
                }
                return Err(Error::EngineFailure("compressed data ends before the end of stream".into()));
            }
            self.fill()?;
        }
    }

    /// Release the source when owned.  Later calls do nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if self.owns_stream {
            if let Some(mut stream) = self.inner.take() {
                let released = stream.close();
                drop(stream);
                log::debug!("inflater stream closed with its owned stream");
                return released;
            }
        }
        Ok(())
    }

    /// Hand back the source without closing it.  Bytes already pulled into
    /// the internal buffer are not returned.
    pub fn into_inner(mut self) -> Result<S> {
        self.closed = true;
        self.inner.take().ok_or(Error::InvalidState("closed"))
    }

    fn fill(&mut self) -> Result<()> {
        let source = self.inner.as_mut().ok_or(Error::InvalidState("closed"))?;
        let got = source.read(&mut self.buffer)?;
        if got == 0 {
            self.source_ended = true;
            self.engine.finish();
        } else {
            self.read_any = true;
            self.engine.set_input(&self.buffer[..got]);
        }
        log::trace!("inflater stream pulled {got} B from source");
        Ok(())
    }
}

impl<S: ByteStream, E: Engine> Drop for InflaterStream<S, E> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("inflater stream teardown failed: {e}");
        }
    }
}

impl<S: ByteStream, E: Engine> ByteStream for InflaterStream<S, E> {
    fn can_read(&self) -> bool {
        !self.closed && self.inner.as_ref().map_or(false, |s| s.can_read())
    }

    fn can_write(&self) -> bool { false }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        InflaterStream::read(self, buf)
    }

    /// Decompressed bytes produced so far.
    fn position(&self) -> Option<u64> { Some(self.engine.total_out()) }

    fn close(&mut self) -> Result<()> {
        InflaterStream::close(self)
    }
}

impl<S: ByteStream, E: Engine> io::Read for InflaterStream<S, E> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(InflaterStream::read(self, buf)?)
    }
}
