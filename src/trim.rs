//! Archive-to-archive filter: copy through only the games whose TimeControl
//! tag is in a keep-set, preserving header and movetext bytes. Shrinking a
//! 30 GB monthly dump down to the studied time controls makes every later
//! scan of the month dramatically cheaper.

use crate::tokenizer::{classify_line, is_moves_start, LineClass};
use crate::util::create_with_backoff;
use crate::zstd_pgn::for_each_line_with_progress_cfg;
use ahash::AHashSet;
use anyhow::{bail, Context, Result};
use indicatif::ProgressBar;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use zstd::stream::write::Encoder;

#[derive(Debug)]
pub struct TrimReport {
    pub games_scanned: u64,
    pub games_kept: u64,
    pub elapsed: Duration,
}

enum Sink {
    Zstd(Encoder<'static, BufWriter<std::fs::File>>),
    Plain(BufWriter<std::fs::File>),
}

impl Sink {
    fn create(path: &Path) -> Result<Self> {
        let file = create_with_backoff(path, 16, 50)
            .with_context(|| format!("creating {}", path.display()))?;
        let w = BufWriter::new(file);
        match path.extension().and_then(|e| e.to_str()) {
            Some("zst") => Ok(Sink::Zstd(Encoder::new(w, 3)?)),
            Some("pgn") | Some("txt") => Ok(Sink::Plain(w)),
            _ => bail!("cannot infer output format from suffix of {}", path.display()),
        }
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let w: &mut dyn Write = match self {
            Sink::Zstd(enc) => enc,
            Sink::Plain(w) => w,
        };
        w.write_all(line.as_bytes())?;
        w.write_all(b"\n")?;
        Ok(())
    }

    fn finish(self) -> Result<()> {
        match self {
            Sink::Zstd(enc) => {
                let mut w = enc.finish()?;
                w.flush()?;
            }
            Sink::Plain(mut w) => w.flush()?,
        }
        Ok(())
    }
}

/// Stream `input`, buffer one game block at a time, and write the block out
/// when its TimeControl matched. A block normally closes at its movetext
/// line; a block closed by the next game's start marker (or end of stream)
/// is flushed without that marker line.
pub fn trim_archive(
    input: &Path,
    output: &Path,
    keep_time_controls: &AHashSet<String>,
    read_buf_bytes: usize,
    pb: Option<ProgressBar>,
) -> Result<TrimReport> {
    let start = Instant::now();
    let mut sink = Sink::create(output)?;

    let mut block: Vec<String> = Vec::new();
    let mut keep_current = false;
    let mut games_scanned: u64 = 0;
    let mut games_kept: u64 = 0;

    let mut on_line = |line: &str| -> Result<()> {
        block.push(line.to_string());
        match classify_line(line) {
            LineClass::GameStart { .. } => {
                // Flush the previous block (everything but the marker line
                // just buffered) before starting over.
                if games_scanned > 0 && keep_current {
                    for l in &block[..block.len() - 1] {
                        sink.write_line(l)?;
                    }
                    games_kept += 1;
                }
                let marker = block.pop().unwrap_or_default();
                block.clear();
                block.push(marker);
                keep_current = false;
                games_scanned += 1;
            }
            LineClass::Tag { name, value } => {
                if name == "TimeControl" && keep_time_controls.contains(value) {
                    keep_current = true;
                }
            }
            LineClass::Other => {
                if is_moves_start(line) {
                    if keep_current {
                        for l in &block {
                            sink.write_line(l)?;
                        }
                        games_kept += 1;
                    }
                    block.clear();
                    keep_current = false;
                }
            }
        }
        Ok(())
    };

    let on_progress = |delta: u64| {
        if let Some(pb) = &pb {
            pb.inc(delta);
        }
    };
    for_each_line_with_progress_cfg(input, read_buf_bytes, on_progress, &mut on_line)?;
    drop(on_line);

    // A final game with no movetext line yet (archive ends mid-block).
    if keep_current && !block.is_empty() {
        for l in &block {
            sink.write_line(l)?;
        }
        games_kept += 1;
    }

    sink.finish()?;
    Ok(TrimReport { games_scanned, games_kept, elapsed: start.elapsed() })
}
