//! Integrity checksums: one [`Checksum`] contract, three independent
//! algorithms.
//!
//! | Kind       | Register seed | Reported before any update | `"123456789"` |
//! |------------|---------------|----------------------------|---------------|
//! | `Crc32`    | `0xFFFFFFFF`  | `0x00000000`               | `0xCBF43926`  |
//! | `BZip2Crc` | `0xFFFFFFFF`  | `0x00000000`               | `0xFC891918`  |
//! | `Adler32`  | `1`           | `0x00000001`               | `0x091E01DE`  |
//!
//! The values are fixed by the container formats that store them and must
//! not change.

mod adler32;
mod bzip2_crc;
mod crc32;

pub use adler32::Adler32;
pub use bzip2_crc::BZip2Crc;
pub use crc32::Crc32;

use std::io::{self, Write};

use crate::error::{check_segment, Result};

// ── Checksum trait ───────────────────────────────────────────────────────────

pub trait Checksum {
    /// Checksum of every byte seen since construction or the last reset.
    fn value(&self) -> u32;

    /// Restore the algorithm seed.
    fn reset(&mut self);

    fn update(&mut self, buffer: &[u8]);

    fn update_byte(&mut self, byte: u8) {
        self.update(&[byte]);
    }

    /// Update with `count` bytes of `buffer` starting at `offset`.
    ///
    /// Offsets are signed because they usually come straight from decoded
    /// headers.  The range is validated before the running value is touched;
    /// on error the value is unchanged.
    fn update_range(&mut self, buffer: Option<&[u8]>, offset: i64, count: i64) -> Result<()> {
        let segment = check_segment(buffer, offset, count)?;
        self.update(segment);
        Ok(())
    }
}

impl<C: Checksum + ?Sized> Checksum for Box<C> {
    fn value(&self) -> u32 { (**self).value() }
    fn reset(&mut self) { (**self).reset() }
    fn update(&mut self, buffer: &[u8]) { (**self).update(buffer) }
    fn update_byte(&mut self, byte: u8) { (**self).update_byte(byte) }
}

// ── ChecksumKind ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumKind {
    Crc32,
    BZip2Crc,
    Adler32,
}

impl ChecksumKind {
    pub const ALL: [ChecksumKind; 3] = [ChecksumKind::Crc32, ChecksumKind::BZip2Crc, ChecksumKind::Adler32];

    pub fn name(self) -> &'static str {
        match self {
            ChecksumKind::Crc32    => "crc32",
            ChecksumKind::BZip2Crc => "bzip2-crc",
            ChecksumKind::Adler32  => "adler32",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "crc32"                => Some(ChecksumKind::Crc32),
            "bzip2-crc" | "bzip2"  => Some(ChecksumKind::BZip2Crc),
            "adler32"   | "adler"  => Some(ChecksumKind::Adler32),
            _                      => None,
        }
    }

    /// Value reported by a fresh accumulator of this kind.
    pub fn seed(self) -> u32 {
        match self {
            ChecksumKind::Crc32 | ChecksumKind::BZip2Crc => 0,
            ChecksumKind::Adler32 => 1,
        }
    }

    pub fn create(self) -> Box<dyn Checksum + Send> {
        match self {
            ChecksumKind::Crc32    => Box::new(Crc32::new()),
            ChecksumKind::BZip2Crc => Box::new(BZip2Crc::new()),
            ChecksumKind::Adler32  => Box::new(Adler32::new()),
        }
    }
}

// ── ChecksumWriter ───────────────────────────────────────────────────────────

/// Writer tee: forwards to `inner` and feeds the checksum with exactly the
/// bytes `inner` accepted.
pub struct ChecksumWriter<W: Write, C: Checksum> {
    inner:    W,
    checksum: C,
    count:    u64,
}

impl<W: Write, C: Checksum> ChecksumWriter<W, C> {
    pub fn new(inner: W, checksum: C) -> Self {
        Self { inner, checksum, count: 0 }
    }

    pub fn value(&self) -> u32 { self.checksum.value() }

    /// Bytes passed through so far.
    pub fn count(&self) -> u64 { self.count }

    pub fn get_ref(&self) -> &W { &self.inner }

    pub fn get_mut(&mut self) -> &mut W { &mut self.inner }

    pub fn into_parts(self) -> (W, C) { (self.inner, self.checksum) }
}

impl<W: Write, C: Checksum> Write for ChecksumWriter<W, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.checksum.update(&buf[..n]);
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const CHECK: &[u8] = b"123456789";

    fn reference(kind: ChecksumKind) -> u32 {
        match kind {
            ChecksumKind::Crc32    => 0xCBF43926,
            ChecksumKind::BZip2Crc => 0xFC891918,
            ChecksumKind::Adler32  => 0x091E01DE,
        }
    }

    #[test]
    fn reference_vectors() {
        for kind in ChecksumKind::ALL {
            let mut c = kind.create();
            assert_eq!(c.value(), kind.seed(), "{} seed", kind.name());
            c.update(CHECK);
            assert_eq!(c.value(), reference(kind), "{} reference", kind.name());
        }
    }

    #[test]
    fn reset_restores_seed() {
        for kind in ChecksumKind::ALL {
            let mut c = kind.create();
            c.update(CHECK);
            c.update_byte(0xFF);
            c.reset();
            assert_eq!(c.value(), kind.seed());
            c.reset();
            assert_eq!(c.value(), kind.seed());
            c.update(CHECK);
            assert_eq!(c.value(), reference(kind), "{} after reset", kind.name());
        }
    }

    #[test]
    fn bad_ranges_leave_value_untouched() {
        for kind in ChecksumKind::ALL {
            let mut c = kind.create();
            c.update(b"prefix");
            let before = c.value();

            assert!(matches!(c.update_range(None, 0, 0), Err(Error::NullArgument(_))));
            assert!(matches!(c.update_range(Some(CHECK), -1, 9), Err(Error::OutOfRange { .. })));
            assert!(matches!(c.update_range(Some(CHECK), 10, 0), Err(Error::InvalidArgument(_))));
            assert!(matches!(c.update_range(Some(CHECK), 0, -1), Err(Error::OutOfRange { .. })));
            assert!(matches!(c.update_range(Some(CHECK), 0, 10), Err(Error::InvalidArgument(_))));

            assert_eq!(c.value(), before, "{}", kind.name());
        }
    }

    #[test]
    fn range_update_matches_slice_update() {
        for kind in ChecksumKind::ALL {
            let mut a = kind.create();
            let mut b = kind.create();
            a.update_range(Some(&b"xx123456789yy"[..]), 2, 9).unwrap();
            b.update(CHECK);
            assert_eq!(a.value(), b.value());
        }
    }

    #[test]
    fn split_updates_are_equivalent() {
        for kind in ChecksumKind::ALL {
            let mut c = kind.create();
            for &b in CHECK {
                c.update_byte(b);
            }
            assert_eq!(c.value(), reference(kind));
        }
    }

    #[test]
    fn names_round_trip() {
        for kind in ChecksumKind::ALL {
            assert_eq!(ChecksumKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ChecksumKind::from_name("ADLER32"), Some(ChecksumKind::Adler32));
        assert_eq!(ChecksumKind::from_name("md5"), None);
    }

    #[test]
    fn writer_tee() {
        let mut w = ChecksumWriter::new(Vec::new(), Crc32::new());
        w.write_all(b"12345").unwrap();
        w.write_all(b"6789").unwrap();
        assert_eq!(w.count(), 9);
        assert_eq!(w.value(), 0xCBF43926);
        let (inner, _) = w.into_parts();
        assert_eq!(inner, CHECK);
    }
}
