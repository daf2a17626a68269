use super::Checksum;

/// Largest prime below 2^16.
const BASE: u32 = 65521;
/// Bytes that can be summed before `b` may overflow a u32.
const NMAX: usize = 5552;

/// Adler-32 (RFC 1950), the zlib stream trailer checksum.
#[derive(Debug, Clone)]
pub struct Adler32 {
    a: u32,
    b: u32,
}

impl Adler32 {
    pub fn new() -> Self {
        Self { a: 1, b: 0 }
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Checksum for Adler32 {
    fn value(&self) -> u32 {
        (self.b << 16) | self.a
    }

    fn reset(&mut self) {
        self.a = 1;
        self.b = 0;
    }

    fn update(&mut self, buffer: &[u8]) {
        let (mut a, mut b) = (self.a, self.b);
        // Reduce once per block rather than per byte.
        for block in buffer.chunks(NMAX) {
            for &byte in block {
                a += byte as u32;
                b += a;
            }
            a %= BASE;
            b %= BASE;
        }
        self.a = a;
        self.b = b;
    }
}
