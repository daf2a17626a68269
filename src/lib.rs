pub mod error;
pub mod checksum;
pub mod codec;
pub mod io_stream;
pub mod name;

pub use error::{Error, Result};
pub use checksum::{Checksum, ChecksumKind, ChecksumWriter};
pub use codec::{compressor, decompressor, CodecError, CodecId, Engine};
pub use io_stream::{copy, ByteStream, DeflaterStream, InflaterStream, Sink, Source, StreamOptions};
pub use name::{clean_name, is_valid_name, validate_name, EntryNameTransform};
