//! Deflate engines over `flate2`'s low-level `Compress`/`Decompress`.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use super::{CodecError, Engine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Run,
    Flush,
    Finish,
}

/// Compressing deflate engine (raw or zlib-wrapped).
pub struct DeflateEngine {
    compress: Compress,
    input:    Vec<u8>,
    pos:      usize,
    mode:     Mode,
    finished: bool,
}

impl DeflateEngine {
    /// `level` 0..=9; `zlib_header` selects the zlib wrapper.
    pub fn new(level: u32, zlib_header: bool) -> Self {
        Self {
            compress: Compress::new(Compression::new(level.min(9)), zlib_header),
            input:    Vec::new(),
            pos:      0,
            mode:     Mode::Run,
            finished: false,
        }
    }

    fn pending(&self) -> &[u8] {
        &self.input[self.pos..]
    }
}

impl Engine for DeflateEngine {
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
        let flush = match self.mode {
            Mode::Run    => FlushCompress::None,
            Mode::Flush  => FlushCompress::Sync,
            Mode::Finish => FlushCompress::Finish,
        };

        let mut produced = 0usize;
        loop {
            let before_in  = self.compress.total_in();
            let before_out = self.compress.total_out();

            let status = self.compress
                .compress(&self.input[self.pos..], &mut output[produced..], flush)
                .map_err(|e| CodecError::Compression(e.to_string()))?;

            let consumed = (self.compress.total_in() - before_in) as usize;
            let written  = (self.compress.total_out() - before_out) as usize;
            self.pos += consumed;
            produced += written;

            if status == Status::StreamEnd {
                self.finished = true;
                break;
            }
            // Output full, or deflate is holding everything internally.
            if produced == output.len() || (consumed == 0 && written == 0) || self.pending().is_empty() {
                break;
            }
        }

        // A sync flush is complete once deflate stops filling the buffer.
        if self.mode == Mode::Flush && produced < output.len() && self.pending().is_empty() {
            self.mode = Mode::Run;
        }
        log::trace!("deflate step: {produced} bytes out, {} pending in", self.pending().len());
        Ok(produced)
    }

    fn needs_input(&self) -> bool {
        !self.finished && self.mode == Mode::Run && self.pending().is_empty()
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

    fn total_in(&self) -> u64 { self.compress.total_in() }

    fn total_out(&self) -> u64 { self.compress.total_out() }
}

/// Decompressing deflate engine.  Bytes after the end of the deflate stream
/// are left unconsumed.
pub struct InflateEngine {
    decompress:  Decompress,
    input:       Vec<u8>,
    pos:         usize,
    output_full: bool,
    finished:    bool,
}

impl InflateEngine {
    pub fn new(zlib_header: bool) -> Self {
        Self {
            decompress:  Decompress::new(zlib_header),
            input:       Vec::new(),
            pos:         0,
            output_full: false,
            finished:    false,
        }
    }
}

impl Engine for InflateEngine {
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
        let before_in  = self.decompress.total_in();
        let before_out = self.decompress.total_out();

        let status = self.decompress
            .decompress(&self.input[self.pos..], output, FlushDecompress::None)
            .map_err(|e| CodecError::Decompression(e.to_string()))?;

        let consumed = (self.decompress.total_in() - before_in) as usize;
        let produced = (self.decompress.total_out() - before_out) as usize;
        self.pos += consumed;
        self.output_full = produced == output.len();
        if status == Status::StreamEnd {
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

    fn total_in(&self) -> u64 { self.decompress.total_in() }

    fn total_out(&self) -> u64 { self.decompress.total_out() }
}
