//! Streaming line access to a (possibly compressed) PGN archive.
//!
//! The codec is chosen from the path suffix: `.zst` goes through a streaming
//! zstd decoder, `.gz` through a gzip decoder, bare `.pgn`/`.txt` is read
//! as-is, and any other compressed suffix is an explicit error, never a
//! silent skip. Unlike forgiving bulk pipelines, a decode fault here aborts
//! the caller's whole scan; partial aggregates from a corrupt archive are
//! worthless.

use anyhow::{bail, Context, Result};
use flate2::read::MultiGzDecoder;
use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use zstd::stream::read::Decoder;

use crate::util::open_with_backoff;

enum Codec {
    Zstd,
    Gzip,
    Plain,
}

fn codec_for(path: &Path) -> Result<Codec> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("zst") => Ok(Codec::Zstd),
        Some("gz") => Ok(Codec::Gzip),
        Some("pgn") | Some("txt") => Ok(Codec::Plain),
        Some(other @ ("bz2" | "xz")) => {
            bail!(
                "unsupported compression codec '.{}' for {}; recompress to .zst or decompress to .pgn",
                other,
                path.display()
            )
        }
        _ => bail!("cannot infer input format from suffix of {}", path.display()),
    }
}

fn open_reader(path: &Path) -> Result<Box<dyn Read>> {
    let file = open_with_backoff(path, 16, 50)
        .with_context(|| format!("opening {}", path.display()))?;
    match codec_for(path)? {
        Codec::Zstd => {
            // window_log_max(31) up front so very large frames don't fail
            // with "Frame requires too much memory".
            let mut decoder = Decoder::new(file)
                .with_context(|| format!("starting zstd decode of {}", path.display()))?;
            decoder.window_log_max(31)?;
            Ok(Box::new(decoder))
        }
        // MultiGzDecoder: the dumps may carry concatenated gzip members.
        Codec::Gzip => Ok(Box::new(MultiGzDecoder::new(file))),
        Codec::Plain => Ok(Box::new(file)),
    }
}

/// Stream the archive line-by-line; `on_line` receives each line with the
/// trailing newline (and any `\r`) stripped. Raw bytes go through a lossy
/// UTF-8 conversion: the dumps occasionally carry mangled player names and a
/// replacement character beats aborting a 20-minute scan over one of them.
/// Read/decode errors propagate to the caller: fatal by contract.
pub fn for_each_line_cfg(
    path: &Path,
    read_buf_bytes: usize,
    mut on_line: impl FnMut(&str) -> Result<()>,
) -> Result<()> {
    let reader = open_reader(path)?;
    let mut reader = BufReader::with_capacity(read_buf_bytes.max(8 * 1024), reader);
    let mut buf: Vec<u8> = Vec::with_capacity(16 * 1024);
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("reading {}", path.display()))?;
        if n == 0 {
            break;
        }
        if buf.ends_with(b"\n") {
            buf.pop();
            if buf.ends_with(b"\r") {
                buf.pop();
            }
        }
        on_line(&String::from_utf8_lossy(&buf))?;
    }
    Ok(())
}

/// A `Read` wrapper that counts compressed bytes consumed, so progress can be
/// reported against the on-disk file size while the decoder inflates.
struct CountingReader<R: Read> {
    inner: R,
    counter: Arc<AtomicU64>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.counter.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

/// Same as [`for_each_line_cfg`] but reports `on_progress(delta_compressed_bytes)`
/// between lines. Same fatal error semantics.
pub fn for_each_line_with_progress_cfg(
    path: &Path,
    read_buf_bytes: usize,
    mut on_progress: impl FnMut(u64),
    mut on_line: impl FnMut(&str) -> Result<()>,
) -> Result<()> {
    let file = open_with_backoff(path, 16, 50)
        .with_context(|| format!("opening {}", path.display()))?;
    let counter = Arc::new(AtomicU64::new(0));
    let counting = CountingReader { inner: file, counter: counter.clone() };

    let inner: Box<dyn Read> = match codec_for(path)? {
        Codec::Zstd => {
            let mut decoder = Decoder::new(counting)
                .with_context(|| format!("starting zstd decode of {}", path.display()))?;
            decoder.window_log_max(31)?;
            Box::new(decoder)
        }
        Codec::Gzip => Box::new(MultiGzDecoder::new(counting)),
        Codec::Plain => Box::new(counting),
    };
    let mut reader = BufReader::with_capacity(read_buf_bytes.max(8 * 1024), inner);

    let mut buf: Vec<u8> = Vec::with_capacity(16 * 1024);
    let mut last = 0u64;
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("reading {}", path.display()))?;
        let cur = counter.load(Ordering::Relaxed);
        if cur > last {
            on_progress(cur - last);
            last = cur;
        }
        if n == 0 {
            break;
        }
        if buf.ends_with(b"\n") {
            buf.pop();
            if buf.ends_with(b"\r") {
                buf.pop();
            }
        }
        on_line(&String::from_utf8_lossy(&buf))?;
    }
    Ok(())
}

/// Compressed size of the archive on disk, for sizing progress bars.
pub fn compressed_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

// ----------------------------- Integrity checks ----------------------------

/// QUICK check: decode up to `max_decompressed_bytes` and stop. Catches a bad
/// frame header or early corruption without paying for the full archive.
pub fn quick_validate(path: &Path, max_decompressed_bytes: u64) -> Result<()> {
    let reader = open_reader(path)?;
    let mut limited = reader.take(max_decompressed_bytes);
    io::copy(&mut limited, &mut io::sink())
        .with_context(|| format!("validating {}", path.display()))?;
    Ok(())
}

/// FULL check: decode the entire stream to EOF. Trailing corruption in the
/// monthly dumps is only caught this way.
pub fn validate_full(path: &Path) -> Result<()> {
    let mut reader = open_reader(path)?;
    io::copy(&mut reader, &mut io::sink())
        .with_context(|| format!("validating {}", path.display()))?;
    Ok(())
}
