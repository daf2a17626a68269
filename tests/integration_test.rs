use proptest::prelude::*;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use tempfile::NamedTempFile;
use zipstream::checksum::{Checksum, ChecksumKind, ChecksumWriter};
use zipstream::codec::{compressor, decompressor, CodecId};
use zipstream::io_stream::{copy, DeflaterStream, InflaterStream, Sink, Source, StreamOptions};
use zipstream::name::{is_valid_name, EntryNameTransform};
use zipstream::Error;

fn compress(codec: CodecId, data: &[u8], write_size: usize) -> Vec<u8> {
    let mut w = DeflaterStream::new(Sink::new(Vec::new()), compressor(codec, codec.default_level()).unwrap()).unwrap();
    for chunk in data.chunks(write_size.max(1)) {
        w.write(chunk).unwrap();
    }
    w.into_inner().unwrap().into_inner()
}

fn decompress(codec: CodecId, packed: &[u8]) -> Vec<u8> {
    let mut r = InflaterStream::new(Source::new(packed), decompressor(codec).unwrap()).unwrap();
    let mut out = Vec::new();
    r.read_to_end(&mut out).unwrap();
    out
}

#[test]
fn test_file_backed_round_trip() {
    let data: Vec<u8> = b"file-backed pipeline: source -> deflater -> file -> inflater -> sink\n"
        .iter().copied().cycle().take(200_000).collect();

    for codec in CodecId::ALL {
        let packed_file = NamedTempFile::new().unwrap();
        let path = packed_file.path().to_path_buf();

        let crc_in = {
            let sink   = Sink::new(BufWriter::new(File::create(&path).unwrap()));
            let stream = DeflaterStream::new(sink, compressor(codec, codec.default_level()).unwrap()).unwrap();
            let mut w  = ChecksumWriter::new(stream, ChecksumKind::Crc32.create());
            copy(&mut &data[..], &mut w, &mut [0u8; 1000]).unwrap();
            let (mut stream, crc) = w.into_parts();
            stream.close().unwrap();
            crc.value()
        };

        let source = Source::new(BufReader::new(File::open(&path).unwrap()));
        let mut r  = InflaterStream::new(source, decompressor(codec).unwrap()).unwrap();
        let mut w  = ChecksumWriter::new(Vec::new(), ChecksumKind::Crc32.create());
        copy(&mut r, &mut w, &mut [0u8; 777]).unwrap();

        assert_eq!(w.value(), crc_in, "{}", codec.name());
        assert_eq!(w.get_ref(), &data, "{}", codec.name());
    }
}

#[test]
fn test_every_checksum_agrees_across_the_pipeline() {
    let data: Vec<u8> = (0..65_536u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8).collect();
    for kind in ChecksumKind::ALL {
        let mut direct = kind.create();
        direct.update(&data);

        let packed = compress(CodecId::Zlib, &data, 4096);
        let mut tee = ChecksumWriter::new(Vec::new(), kind.create());
        tee.write_all(&decompress(CodecId::Zlib, &packed)).unwrap();
        assert_eq!(tee.value(), direct.value(), "{}", kind.name());
    }
}

#[test]
fn test_zero_byte_write_then_close_emits_a_stream() {
    let mut w = DeflaterStream::with_options(
        Sink::new(Vec::new()),
        compressor(CodecId::Deflate, 6).unwrap(),
        StreamOptions { owns_stream: false, ..Default::default() },
    ).unwrap();
    assert_eq!(w.get_ref().unwrap().get_ref().len(), 0, "nothing before the first write");
    w.write(&[]).unwrap();
    w.close().unwrap();
    let packed = w.get_ref().unwrap().get_ref().clone();
    assert!(!packed.is_empty());
    assert!(decompress(CodecId::Deflate, &packed).is_empty());
}

#[test]
fn test_concatenated_streams_read_back_one_at_a_time() {
    let mut joined = compress(CodecId::Deflate, b"first", 16);
    joined.extend(compress(CodecId::Deflate, b"second", 16));

    // Only the first stream is decoded; the rest is trailing data.
    assert_eq!(decompress(CodecId::Deflate, &joined), b"first");
}

#[test]
fn test_truncated_file_is_an_engine_failure() {
    let packed = compress(CodecId::Zstd, &[7u8; 50_000], 5000);
    let cut = &packed[..packed.len() - 4];
    let mut r = InflaterStream::new(Source::new(cut), decompressor(CodecId::Zstd).unwrap()).unwrap();
    let mut buf = [0u8; 4096];
    let err = loop {
        match r.read(&mut buf) {
            Ok(0) => panic!("truncated input decoded to completion"),
            Ok(_) => continue,
            Err(e) => break e,
        }
    };
    assert!(matches!(err, Error::EngineFailure(_)), "{err}");
}

#[test]
fn test_entries_named_and_checksummed() {
    let transform = EntryNameTransform::with_root(r"C:\work\project");
    let inputs: [(&str, &[u8]); 3] = [
        (r"C:\work\project\src\main.rs", b"fn main() {}"),
        (r"c:\WORK\Project\README", b"read me"),
        (r"D:\elsewhere\notes.txt", b""),
    ];
    let expected = ["src/main.rs", "README", "elsewhere/notes.txt"];

    for ((path, body), want) in inputs.iter().zip(expected) {
        let name = transform.transform_file(path).unwrap();
        assert_eq!(name, want);
        assert!(is_valid_name(&name));

        let mut w = ChecksumWriter::new(
            DeflaterStream::new(Sink::new(Vec::new()), compressor(CodecId::Deflate, 9).unwrap()).unwrap(),
            ChecksumKind::Crc32.create(),
        );
        w.write_all(body).unwrap();
        let (stream, crc) = w.into_parts();
        let packed = stream.into_inner().unwrap().into_inner();

        let mut check = ChecksumKind::Crc32.create();
        check.update(&decompress(CodecId::Deflate, &packed));
        assert_eq!(check.value(), crc.value(), "{name}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_round_trip(
        data in proptest::collection::vec(any::<u8>(), 0..20_000),
        write_size in 1usize..5000,
        codec in proptest::sample::select(CodecId::ALL.to_vec()),
    ) {
        let packed = compress(codec, &data, write_size);
        prop_assert_eq!(decompress(codec, &packed), data);
    }

    #[test]
    fn prop_transform_output_is_valid(path in "[a-zA-Z0-9:*?<>|\\\\/. _-]{0,64}") {
        let name = EntryNameTransform::new().transform_file(&path).unwrap();
        prop_assert!(!name.contains('\\'));
        prop_assert!(!name.starts_with('/'));
        prop_assert!(is_valid_name(&name), "{:?} -> {:?}", path, name);
    }
}
