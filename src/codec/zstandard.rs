//! Zstandard engines over the streaming `zstd::stream::raw` operations.

use ::zstd::stream::raw::{Decoder, Encoder, InBuffer, Operation, OutBuffer};

use super::{CodecError, Engine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Run,
    Flush,
    Finish,
}

pub struct ZstdEncoderEngine {
    encoder:   Encoder<'static>,
    input:     Vec<u8>,
    pos:       usize,
    mode:      Mode,
    finished:  bool,
    total_in:  u64,
    total_out: u64,
}

impl ZstdEncoderEngine {
    pub fn new(level: i32) -> Result<Self, CodecError> {
        let encoder = Encoder::new(level).map_err(|e| CodecError::Init(e.to_string()))?;
        Ok(Self {
            encoder,
            input:     Vec::new(),
            pos:       0,
            mode:      Mode::Run,
            finished:  false,
            total_in:  0,
            total_out: 0,
        })
    }

    /// Feed pending input; returns whether any input was left to feed.
    fn run_input(&mut self, out: &mut OutBuffer<'_, [u8]>) -> Result<bool, CodecError> {
        if self.pos == self.input.len() {
            return Ok(false);
        }
        let mut src = InBuffer::around(&self.input[self.pos..]);
        self.encoder
            .run(&mut src, out)
            .map_err(|e| CodecError::Compression(e.to_string()))?;
        self.pos       += src.pos();
        self.total_in  += src.pos() as u64;
        Ok(true)
    }
}

impl Engine for ZstdEncoderEngine {
    fn set_input(&mut self, input: &[u8]) {
        if self.pos == self.input.len() {
            self.input.clear();
            self.pos = 0;
        }
        self.input.extend_from_slice(input);
    }

    fn step(&mut self, output: &mut [u8]) -> Result<usize, CodecError> {
        if self.finished || output.is_empty() {
            return Ok(0);
        }
        let mut out = OutBuffer::around(output);

        // Pending input always goes in before any flush or end-of-frame.
        if !self.run_input(&mut out)? {
            match self.mode {
                Mode::Run => {}
                Mode::Flush => {
                    let remaining = self.encoder
                        .flush(&mut out)
                        .map_err(|e| CodecError::Compression(e.to_string()))?;
                    if remaining == 0 {
                        self.mode = Mode::Run;
                    }
                }
                Mode::Finish => {
                    let remaining = self.encoder
                        .finish(&mut out, true)
                        .map_err(|e| CodecError::Compression(e.to_string()))?;
                    if remaining == 0 {
                        self.finished = true;
                    }
                }
            }
        }

        let produced = out.pos();
        self.total_out += produced as u64;
        Ok(produced)
    }

    fn needs_input(&self) -> bool {
        !self.finished && self.mode == Mode::Run && self.pos == self.input.len()
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn flush(&mut self) {
        if self.mode == Mode::Run && !self.finished {
            self.mode = Mode::Flush;
        }
    }

    fn finish(&mut self) {
        self.mode = Mode::Finish;
    }

    fn total_in(&self) -> u64 { self.total_in }

    fn total_out(&self) -> u64 { self.total_out }
}

/// Decodes a single zstd frame; anything after the frame is ignored.
pub struct ZstdDecoderEngine {
    decoder:     Decoder<'static>,
    input:       Vec<u8>,
    pos:         usize,
    output_full: bool,
    finished:    bool,
    total_in:    u64,
    total_out:   u64,
}

impl ZstdDecoderEngine {
    pub fn new() -> Result<Self, CodecError> {
        let decoder = Decoder::new().map_err(|e| CodecError::Init(e.to_string()))?;
        Ok(Self {
            decoder,
            input:       Vec::new(),
            pos:         0,
            output_full: false,
            finished:    false,
            total_in:    0,
            total_out:   0,
        })
    }
}

impl Engine for ZstdDecoderEngine {
    fn set_input(&mut self, input: &[u8]) {
        if self.pos == self.input.len() {
            self.input.clear();
            self.pos = 0;
        }
        self.input.extend_from_slice(input);
    }

    fn step(&mut self, output: &mut [u8]) -> Result<usize, CodecError> {
        if self.finished || output.is_empty() {
            return Ok(0);
        }
        let capacity = output.len();
        let mut out = OutBuffer::around(output);
        let mut src = InBuffer::around(&self.input[self.pos..]);

        // A zero hint means the frame is fully decoded and flushed.
        let hint = self.decoder
            .run(&mut src, &mut out)
            .map_err(|e| CodecError::Decompression(e.to_string()))?;

        let consumed = src.pos();
        let produced = out.pos();
        self.pos       += consumed;
        self.total_in  += consumed as u64;
        self.total_out += produced as u64;
        self.output_full = produced == capacity;
        if hint == 0 {
            self.finished = true;
        }
        Ok(produced)
    }

    fn needs_input(&self) -> bool {
        !self.finished && !self.output_full && self.pos == self.input.len()
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self) {}

    fn total_in(&self) -> u64 { self.total_in }

    fn total_out(&self) -> u64 { self.total_out }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tests::run_engine;

    #[test]
    fn output_decodes_with_one_shot_api() {
        let data: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        let mut e = ZstdEncoderEngine::new(3).unwrap();
        let packed = run_engine(&mut e, &data, 4096, 512);
        assert_eq!(::zstd::decode_all(&packed[..]).unwrap(), data);
        assert_eq!(e.total_in(), data.len() as u64);
        assert_eq!(e.total_out(), packed.len() as u64);
    }

    #[test]
    fn decodes_one_shot_output_in_small_steps() {
        let data = b"zstd frame produced by encode_all, decoded one byte of input at a time".repeat(20);
        let packed = ::zstd::encode_all(&data[..], 5).unwrap();
        let mut d = ZstdDecoderEngine::new().unwrap();
        assert_eq!(run_engine(&mut d, &packed, 1, 16), data);
        assert!(d.is_finished());
    }

    #[test]
    fn truncated_frame_never_finishes() {
        let packed = ::zstd::encode_all(&b"some payload that will be cut short"[..], 3).unwrap();
        let mut d = ZstdDecoderEngine::new().unwrap();
        d.set_input(&packed[..packed.len() - 3]);
        let mut out = [0u8; 128];
        while d.step(&mut out).unwrap() > 0 {}
        assert!(!d.is_finished());
        assert!(d.needs_input());
    }
}
