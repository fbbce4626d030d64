//! Time-control distribution census: one streaming pass that counts games per
//! TimeControl value across an archive. The cheap reconnaissance step before
//! a study commits to a time-control set.

use crate::tokenizer::{classify_line, LineClass};
use crate::util::{create_with_backoff, replace_file_atomic};
use crate::zstd_pgn::for_each_line_with_progress_cfg;
use ahash::AHashMap;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

/// Fixed header row of the census output table.
pub const CENSUS_CSV_HEADER: &str = "TimeControl,Count,Proportion (%)";

/// Per-archive counts of each TimeControl value. A game is counted once per
/// TimeControl tag it carries; the monthly dumps emit exactly one per game.
#[derive(Debug, Default)]
pub struct TimeControlCensus {
    pub total_games: u64,
    pub counts: AHashMap<String, u64>,
    pub elapsed: Duration,
}

impl TimeControlCensus {
    /// Counts ordered by frequency, most common first; ties break by name so
    /// the ordering is stable across runs.
    pub fn sorted_counts(&self) -> Vec<(&str, u64)> {
        let mut rows: Vec<(&str, u64)> =
            self.counts.iter().map(|(tc, n)| (tc.as_str(), *n)).collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows
    }
}

/// Stream `input` and tally every TimeControl tag. Same fatal error semantics
/// as the stats scan: a decode fault aborts the whole census.
pub fn census_time_controls(
    input: &Path,
    read_buf_bytes: usize,
    pb: Option<ProgressBar>,
) -> Result<TimeControlCensus> {
    let start = Instant::now();
    let mut census = TimeControlCensus::default();

    let mut on_line = |line: &str| -> Result<()> {
        if let LineClass::Tag { name: "TimeControl", value } = classify_line(line) {
            census.total_games += 1;
            *census.counts.entry(value.to_string()).or_insert(0) += 1;
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

    census.elapsed = start.elapsed();
    Ok(census)
}

/// Serialize the census as CSV, most common time control first. Values are
/// quoted (they contain `+`), proportions are percentages to two decimals.
/// An empty archive still produces the header row. Same tmp+atomic publish
/// as the player sample writer.
pub fn write_census_csv(out_path: &Path, census: &TimeControlCensus) -> Result<()> {
    let tmp = out_path.with_extension("tmp");
    {
        let f = create_with_backoff(&tmp, 16, 50)
            .with_context(|| format!("creating census output {}", tmp.display()))?;
        let mut w = BufWriter::new(f);
        writeln!(w, "{}", CENSUS_CSV_HEADER).context("writing census output")?;
        for (tc, count) in census.sorted_counts() {
            let proportion = (count as f64 / census.total_games as f64) * 100.0;
            writeln!(w, "\"{}\",{},{:.2}", tc, count, proportion)
                .context("writing census output")?;
        }
        w.flush().context("writing census output")?;
    }
    replace_file_atomic(&tmp, out_path)
        .with_context(|| format!("publishing census output {}", out_path.display()))
}
