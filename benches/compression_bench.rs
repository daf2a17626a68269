use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::io::Read;
use zipstream::checksum::{Checksum, ChecksumKind};
use zipstream::codec::{compressor, decompressor, CodecId};
use zipstream::io_stream::{DeflaterStream, InflaterStream, Sink, Source};

fn sample(len: usize) -> Vec<u8> {
    b"streaming adapters move bytes through an engine one buffer at a time. "
        .iter().copied().cycle().take(len).collect()
}

fn pack(codec: CodecId, data: &[u8]) -> Vec<u8> {
    let mut w = DeflaterStream::new(Sink::new(Vec::new()), compressor(codec, codec.default_level()).unwrap()).unwrap();
    for chunk in data.chunks(64 * 1024) {
        w.write(chunk).unwrap();
    }
    w.into_inner().unwrap().into_inner()
}

fn bench_deflater(c: &mut Criterion) {
    let data = sample(1024 * 1024);
    let mut group = c.benchmark_group("deflater_1mb");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for codec in [CodecId::Deflate, CodecId::Zstd] {
        group.bench_function(codec.name(), |b| b.iter(|| pack(codec, black_box(&data))));
    }
    group.finish();
}

fn bench_inflater(c: &mut Criterion) {
    let data = sample(1024 * 1024);
    let mut group = c.benchmark_group("inflater_1mb");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for codec in [CodecId::Deflate, CodecId::Zstd] {
        let packed = pack(codec, &data);
        group.bench_function(codec.name(), |b| {
            b.iter(|| {
                let mut r = InflaterStream::new(Source::new(black_box(&packed[..])), decompressor(codec).unwrap()).unwrap();
                let mut out = Vec::with_capacity(data.len());
                r.read_to_end(&mut out).unwrap();
                out
            })
        });
    }
    group.finish();
}

fn bench_checksums(c: &mut Criterion) {
    let data = sample(1024 * 1024);
    let mut group = c.benchmark_group("checksum_1mb");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for kind in ChecksumKind::ALL {
        group.bench_function(kind.name(), |b| {
            b.iter(|| {
                let mut sum = kind.create();
                sum.update(black_box(&data));
                sum.value()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_deflater, bench_inflater, bench_checksums);
criterion_main!(benches);
