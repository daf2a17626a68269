use crc32fast::Hasher;

use super::Checksum;

/// Standard CRC-32 (IEEE, reflected polynomial `0xEDB88320`), as stored by
/// zip and gzip.
#[derive(Clone, Default)]
pub struct Crc32 {
    hasher: Hasher,
}

impl Crc32 {
    pub fn new() -> Self {
        Self { hasher: Hasher::new() }
    }
}

impl Checksum for Crc32 {
    fn value(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    fn reset(&mut self) {
        self.hasher.reset();
    }

    fn update(&mut self, buffer: &[u8]) {
        self.hasher.update(buffer);
    }
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Crc32({:#010x})", self.value())
    }
}
