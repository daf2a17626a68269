//! Engine capability contract and the built-in engine registry.
//!
//! An [`Engine`] is the opaque unit that actually transforms bytes.  The
//! stream adapters in [`crate::io_stream`] only ever talk to this trait, so
//! any algorithm can sit behind them without the adapters changing.
//!
//! # State model
//! At any time an engine is in one of three observable states:
//!   - *needs input*: nothing more can be produced until [`Engine::set_input`]
//!     supplies more bytes (or [`Engine::finish`] is called).
//!   - *has output*: [`Engine::step`] will return a non-zero count.
//!   - *finished*: no further output will ever be produced.
//!
//! `step` returning `0` while the engine is neither finished nor waiting for
//! input is a contract violation; adapters report it as
//! [`Error::EngineFailure`](crate::Error::EngineFailure) and never retry.

mod deflate;
mod zstandard;

pub use deflate::{DeflateEngine, InflateEngine};
pub use zstandard::{ZstdDecoderEngine, ZstdEncoderEngine};

use std::io;
use thiserror::Error;

use crate::error::{Error, Result};

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Compression error: {0}")]
    Compression(String),
    #[error("Decompression error: {0}")]
    Decompression(String),
    #[error("Codec initialisation failed: {0}")]
    Init(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── Engine trait ─────────────────────────────────────────────────────────────

pub trait Engine {
    /// Stage bytes for the following steps.  The engine copies them; input
    /// not yet consumed by an earlier call is kept ahead of the new bytes.
    fn set_input(&mut self, input: &[u8]);

    /// Produce up to `output.len()` transformed bytes and return the count.
    /// Returns `0` when nothing can be produced without more input or a
    /// finish signal.
    fn step(&mut self, output: &mut [u8]) -> std::result::Result<usize, CodecError>;

    fn needs_input(&self) -> bool;

    fn is_finished(&self) -> bool;

    /// Request that everything produceable from the input so far be emitted
    /// by the next steps, without ending the stream.  Engines with nothing
    /// to flush ignore it.
    fn flush(&mut self) {}

    /// No more input will be supplied; subsequent steps drain what is left
    /// until [`is_finished`](Engine::is_finished) turns true.
    fn finish(&mut self);

    /// Input bytes consumed so far.
    fn total_in(&self) -> u64;

    /// Output bytes produced so far.
    fn total_out(&self) -> u64;
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn set_input(&mut self, input: &[u8]) { (**self).set_input(input) }
    fn step(&mut self, output: &mut [u8]) -> std::result::Result<usize, CodecError> { (**self).step(output) }
    fn needs_input(&self) -> bool { (**self).needs_input() }
    fn is_finished(&self) -> bool { (**self).is_finished() }
    fn flush(&mut self) { (**self).flush() }
    fn finish(&mut self) { (**self).finish() }
    fn total_in(&self) -> u64 { (**self).total_in() }
    fn total_out(&self) -> u64 { (**self).total_out() }
}

// ── CodecId ──────────────────────────────────────────────────────────────────

/// Built-in engine families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecId {
    /// Bytes pass through untouched.
    Stored,
    /// Raw deflate, no header or trailer.
    Deflate,
    /// Deflate wrapped in a zlib header and Adler-32 trailer.
    Zlib,
    Zstd,
}

impl CodecId {
    pub const ALL: [CodecId; 4] = [CodecId::Stored, CodecId::Deflate, CodecId::Zlib, CodecId::Zstd];

    /// Human-readable name (for diagnostics and CLI parsing).
    pub fn name(self) -> &'static str {
        match self {
            CodecId::Stored  => "stored",
            CodecId::Deflate => "deflate",
            CodecId::Zlib    => "zlib",
            CodecId::Zstd    => "zstd",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "stored" | "none" => Some(CodecId::Stored),
            "deflate"         => Some(CodecId::Deflate),
            "zlib"            => Some(CodecId::Zlib),
            "zstd"            => Some(CodecId::Zstd),
            _                 => None,
        }
    }

    /// Accepted compression levels, inclusive.
    pub fn level_range(self) -> (i32, i32) {
        match self {
            CodecId::Stored                  => (0, 0),
            CodecId::Deflate | CodecId::Zlib => (0, 9),
            CodecId::Zstd                    => (1, 22),
        }
    }

    pub fn default_level(self) -> i32 {
        match self {
            CodecId::Stored                  => 0,
            CodecId::Deflate | CodecId::Zlib => 6,
            CodecId::Zstd                    => 3,
        }
    }

    fn check_level(self, level: i32) -> Result<()> {
        if self == CodecId::Stored {
            return Ok(());
        }
        let (min, max) = self.level_range();
        if level < min || level > max {
            return Err(Error::OutOfRange {
                name:  "level",
                value: level as i64,
                min:   min as i64,
                max:   max as i64,
            });
        }
        Ok(())
    }
}

// ── Stored engine ────────────────────────────────────────────────────────────

/// Identity engine; used for stored entries and as a reference
/// implementation of the contract.
#[derive(Debug, Default)]
pub struct StoredEngine {
    pending:   Vec<u8>,
    pos:       usize,
    finishing: bool,
    total_in:  u64,
    total_out: u64,
}

impl StoredEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Engine for StoredEngine {
    fn set_input(&mut self, input: &[u8]) {
        if self.pos == self.pending.len() {
            self.pending.clear();
            self.pos = 0;
        }
        self.pending.extend_from_slice(input);
        self.total_in += input.len() as u64;
    }

    fn step(&mut self, output: &mut [u8]) -> std::result::Result<usize, CodecError> {
        let n = (self.pending.len() - self.pos).min(output.len());
        output[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        self.total_out += n as u64;
        Ok(n)
    }

    fn needs_input(&self) -> bool {
        !self.finishing && self.pos == self.pending.len()
    }

    fn is_finished(&self) -> bool {
        self.finishing && self.pos == self.pending.len()
    }

    fn finish(&mut self) {
        self.finishing = true;
    }

    fn total_in(&self) -> u64 { self.total_in }

    fn total_out(&self) -> u64 { self.total_out }
}

// ── Factory ──────────────────────────────────────────────────────────────────

/// Build a compressing engine for `id` at `level`.
///
/// Levels outside [`CodecId::level_range`] fail with
/// [`Error::OutOfRange`]; the stored codec ignores the level.
pub fn compressor(id: CodecId, level: i32) -> Result<Box<dyn Engine + Send>> {
    id.check_level(level)?;
    Ok(match id {
        CodecId::Stored  => Box::new(StoredEngine::new()),
        CodecId::Deflate => Box::new(DeflateEngine::new(level as u32, false)),
        CodecId::Zlib    => Box::new(DeflateEngine::new(level as u32, true)),
        CodecId::Zstd    => Box::new(ZstdEncoderEngine::new(level)?),
    })
}

/// Build the decompressing engine matching [`compressor`] output for `id`.
pub fn decompressor(id: CodecId) -> Result<Box<dyn Engine + Send>> {
    Ok(match id {
        CodecId::Stored  => Box::new(StoredEngine::new()),
        CodecId::Deflate => Box::new(InflateEngine::new(false)),
        CodecId::Zlib    => Box::new(InflateEngine::new(true)),
        CodecId::Zstd    => Box::new(ZstdDecoderEngine::new()?),
    })
}
