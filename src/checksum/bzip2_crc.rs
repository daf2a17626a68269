use super::Checksum;

/// Register value before the first byte.
const CRC_INIT: u32 = 0xFFFF_FFFF;
/// Generator polynomial, processed most significant bit first.
const POLYNOMIAL: u32 = 0x04C1_1DB7;

const TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = (n as u32) << 24;
        let mut k = 0;
        while k < 8 {
            c = if c & 0x8000_0000 != 0 { (c << 1) ^ POLYNOMIAL } else { c << 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// CRC-32 as used by the bzip2 stream format: same polynomial as
/// [`Crc32`](super::Crc32) but unreflected, shifting MSB first.
#[derive(Debug, Clone)]
pub struct BZip2Crc {
    register: u32,
}

impl BZip2Crc {
    pub fn new() -> Self {
        Self { register: CRC_INIT }
    }
}

impl Default for BZip2Crc {
    fn default() -> Self {
        Self::new()
    }
}

impl Checksum for BZip2Crc {
    fn value(&self) -> u32 {
        !self.register
    }

    fn reset(&mut self) {
        self.register = CRC_INIT;
    }

    fn update(&mut self, buffer: &[u8]) {
        let mut crc = self.register;
        for &b in buffer {
            crc = (crc << 8) ^ TABLE[((crc >> 24) ^ b as u32) as usize];
        }
        self.register = crc;
    }

    fn update_byte(&mut self, byte: u8) {
        self.register = (self.register << 8) ^ TABLE[((self.register >> 24) ^ byte as u32) as usize];
    }
}
