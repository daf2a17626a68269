use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use zipstream::checksum::{Checksum, ChecksumKind, ChecksumWriter};
use zipstream::codec::{compressor, decompressor, CodecId};
use zipstream::io_stream::{copy, DeflaterStream, InflaterStream, Sink, Source, StreamOptions, DEFAULT_BUFFER_SIZE};
use zipstream::name::EntryNameTransform;

#[derive(Parser)]
#[command(name = "zipstream", about = "Streaming compression, checksums and entry names")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file through a streaming engine
    Compress {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Codec: deflate (default), zlib, zstd, stored
        #[arg(short, long, default_value = "deflate", value_parser = parse_codec)]
        codec: CodecId,
        /// Compression level (deflate/zlib 0-9; zstd 1-22); codec default if omitted
        #[arg(short, long)]
        level: Option<i32>,
        /// Adapter buffer size in bytes (at least 512)
        #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
        buffer_size: usize,
        /// Checksum of the uncompressed input: crc32 (default), bzip2-crc, adler32
        #[arg(long, default_value = "crc32", value_parser = parse_checksum)]
        checksum: ChecksumKind,
    },
    /// Decompress a file produced by `compress`
    Decompress {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, default_value = "deflate", value_parser = parse_codec)]
        codec: CodecId,
        #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
        buffer_size: usize,
        /// Checksum of the decompressed output
        #[arg(long, default_value = "crc32", value_parser = parse_checksum)]
        checksum: ChecksumKind,
    },
    /// Print checksums of files
    Checksum {
        #[arg(short, long, default_value = "crc32", value_parser = parse_checksum)]
        kind: ChecksumKind,
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
    },
    /// Print the archive entry name for host paths
    EntryName {
        /// Prefix stripped (case-insensitively) from every path
        #[arg(short, long)]
        root: Option<String>,
        /// Treat the paths as directories
        #[arg(short, long)]
        directory: bool,
        #[arg(required = true, num_args = 1..)]
        paths: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {

        // ── Compress ─────────────────────────────────────────────────────────
        Commands::Compress { input, output, codec, level, buffer_size, checksum } => {
            let level   = level.unwrap_or(codec.default_level());
            let options = StreamOptions { buffer_size, ..Default::default() };
            let sink    = Sink::new(BufWriter::new(File::create(&output)?));
            let stream  = DeflaterStream::with_options(sink, compressor(codec, level)?, options)?;

            let mut src    = BufReader::new(File::open(&input)?);
            let mut writer = ChecksumWriter::new(stream, checksum.create());
            copy(&mut src, &mut writer, &mut vec![0u8; buffer_size])?;

            let (mut stream, sum) = writer.into_parts();
            stream.finish()?;
            let (read, written) = (stream.total_in(), stream.total_out());
            stream.close()?;
            println!("{} → {}: {} → {} B ({} level {}, {} {:08x})",
                input.display(), output.display(), read, written,
                codec.name(), level, checksum.name(), sum.value());
        }

        // ── Decompress ───────────────────────────────────────────────────────
        Commands::Decompress { input, output, codec, buffer_size, checksum } => {
            let options    = StreamOptions { buffer_size, ..Default::default() };
            let source     = Source::new(BufReader::new(File::open(&input)?));
            let mut stream = InflaterStream::with_options(source, decompressor(codec)?, options)?;

            let mut writer = ChecksumWriter::new(BufWriter::new(File::create(&output)?), checksum.create());
            copy(&mut stream, &mut writer, &mut vec![0u8; buffer_size])?;
            stream.close()?;
            println!("{} → {}: {} → {} B ({}, {} {:08x})",
                input.display(), output.display(), stream.total_in(), writer.count(),
                codec.name(), checksum.name(), writer.value());
        }

        // ── Checksum ─────────────────────────────────────────────────────────
        Commands::Checksum { kind, files } => {
            let mut buf = vec![0u8; DEFAULT_BUFFER_SIZE];
            for path in &files {
                let mut writer = ChecksumWriter::new(io::sink(), kind.create());
                copy(&mut BufReader::new(File::open(path)?), &mut writer, &mut buf)?;
                println!("{:08x}  {:>10}  {}", writer.value(), writer.count(), path.display());
            }
        }

        // ── EntryName ────────────────────────────────────────────────────────
        Commands::EntryName { root, directory, paths } => {
            let transform = root.map(|r| EntryNameTransform::with_root(r)).unwrap_or_default();
            for path in &paths {
                let name = if directory {
                    transform.transform_directory(path)?
                } else {
                    transform.transform_file(path)?
                };
                println!("{path}  →  {name}");
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn parse_codec(s: &str) -> Result<CodecId, String> {
    CodecId::from_name(s).ok_or_else(|| {
        let known: Vec<_> = CodecId::ALL.iter().map(|c| c.name()).collect();
        format!("unknown codec '{s}' (expected one of: {})", known.join(", "))
    })
}

fn parse_checksum(s: &str) -> Result<ChecksumKind, String> {
    ChecksumKind::from_name(s).ok_or_else(|| {
        let known: Vec<_> = ChecksumKind::ALL.iter().map(|k| k.name()).collect();
        format!("unknown checksum '{s}' (expected one of: {})", known.join(", "))
    })
}
