//! Crate-wide error taxonomy and the shared byte-segment validator.
//!
//! Argument validation is eager: every check runs before any state is
//! touched, so a failed call leaves checksums and streams exactly as they
//! were.

use std::io;
use thiserror::Error;

use crate::codec::CodecError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Argument `{0}` is absent")]
    NullArgument(&'static str),
    #[error("{name} out of range: {value}, should be {min}..{max}")]
    OutOfRange {
        name:  &'static str,
        value: i64,
        min:   i64,
        max:   i64,
    },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{0} is not supported by this stream")]
    OperationNotSupported(&'static str),
    #[error("Path too long: {len} bytes exceeds the maximum of {max}")]
    PathTooLong { len: usize, max: usize },
    /// The wrapped engine broke its contract (stalled before finishing).
    /// Never retried; the pipeline must be rebuilt.
    #[error("Engine failure: {0}")]
    EngineFailure(String),
    #[error("Stream is {0}")]
    InvalidState(&'static str),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        let kind = match e {
            Error::Io(inner) => return inner,
            Error::NullArgument(_)
            | Error::OutOfRange { .. }
            | Error::InvalidArgument(_)
            | Error::PathTooLong { .. } => io::ErrorKind::InvalidInput,
            Error::OperationNotSupported(_) => io::ErrorKind::Unsupported,
            Error::Codec(_) | Error::EngineFailure(_) => io::ErrorKind::InvalidData,
            Error::InvalidState(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, e)
    }
}

/// Resolve `(buffer, offset, count)` to the addressed sub-slice.
///
/// Checks, in order: absent buffer, negative offset, offset past the end,
/// negative count, range past the end.
pub fn check_segment(buffer: Option<&[u8]>, offset: i64, count: i64) -> Result<&[u8]> {
    let buffer = buffer.ok_or(Error::NullArgument("buffer"))?;
    let len = buffer.len() as i64;

    if offset < 0 {
        return Err(Error::OutOfRange { name: "offset", value: offset, min: 0, max: len });
    }
    if offset > len {
        return Err(Error::InvalidArgument(format!(
            "offset {offset} is past the end of a {len}-byte buffer"
        )));
    }
    if count < 0 {
        return Err(Error::OutOfRange { name: "count", value: count, min: 0, max: len - offset });
    }
    if count > len - offset {
        return Err(Error::InvalidArgument(format!(
            "offset {offset} + count {count} exceeds buffer length {len}"
        )));
    }

    let start = offset as usize;
    Ok(&buffer[start..start + count as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECK: &[u8] = b"123456789";

    #[test]
    fn whole_and_partial_segments() {
        assert_eq!(check_segment(Some(CHECK), 0, 9).unwrap(), CHECK);
        assert_eq!(check_segment(Some(CHECK), 2, 3).unwrap(), b"345");
        assert!(check_segment(Some(CHECK), 9, 0).unwrap().is_empty());
    }

    #[test]
    fn rejections_follow_the_documented_order() {
        assert!(matches!(check_segment(None, -1, -1), Err(Error::NullArgument("buffer"))));
        assert!(matches!(check_segment(Some(CHECK), -1, 9), Err(Error::OutOfRange { name: "offset", .. })));
        assert!(matches!(check_segment(Some(CHECK), 10, 0), Err(Error::InvalidArgument(_))));
        assert!(matches!(check_segment(Some(CHECK), 0, -1), Err(Error::OutOfRange { name: "count", .. })));
        assert!(matches!(check_segment(Some(CHECK), 0, 10), Err(Error::InvalidArgument(_))));
        assert!(matches!(check_segment(Some(CHECK), 5, i64::MAX), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn io_error_kinds() {
        let e: io::Error = Error::OperationNotSupported("seek").into();
        assert_eq!(e.kind(), io::ErrorKind::Unsupported);
        let e: io::Error = Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "gone")).into();
        assert_eq!(e.kind(), io::ErrorKind::BrokenPipe);
    }
}
