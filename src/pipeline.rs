//! The stream driver: owns the decompression pipeline, drives
//! tokenizer -> accumulator -> aggregator one line at a time, reports
//! progress, and converts any fault into a diagnostic snapshot before
//! failing the whole scan.

use crate::aggregate::StatsAggregator;
use crate::census::{census_time_controls, TimeControlCensus};
use crate::config::ScanOptions;
use crate::header::{GameHeader, HeaderAccumulator};
use crate::progress::make_progress_bar_labeled;
use crate::sample::{sample_grinders, write_sample_csv};
use crate::tokenizer::classify_line;
use crate::trim::{trim_archive, TrimReport};
use crate::util::{format_elapsed, init_tracing_once};
use crate::zstd_pgn::{
    compressed_size, for_each_line_cfg, for_each_line_with_progress_cfg,
};
use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

/// State captured at the moment a scan dies: enough to find the offending
/// spot in a 30 GB archive without re-running.
#[derive(Debug)]
pub struct ScanDiagnostics {
    /// 1-based line number at which the failure occurred.
    pub line_number: u64,
    /// Last raw line that was successfully read and tokenized.
    pub last_line: String,
    /// The partially accumulated header of the game open at failure time.
    pub open_header: Option<GameHeader>,
}

impl fmt::Display for ScanDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scan aborted at line {}; last line read: {:?}; open game header: {:?}",
            self.line_number, self.last_line, self.open_header
        )
    }
}

/// Result of one complete scan. The table is handed to the caller so a failed
/// output write can be retried without rescanning.
#[derive(Debug)]
pub struct ScanReport {
    pub games_scanned: u64,
    pub lines_read: u64,
    pub distinct_players: usize,
    pub table: crate::aggregate::PlayerTable,
    pub elapsed: Duration,
}

/// Outcome of sampling + writing, for the caller's summary line.
#[derive(Debug)]
pub struct SampleSummary {
    pub unique_players: usize,
    pub grinders: usize,
    pub written: usize,
    /// True when the qualifying population fit inside the requested sample
    /// size and was used whole.
    pub used_entire_population: bool,
}

#[derive(Clone, Default)]
pub struct PgnETL {
    pub(crate) opts: ScanOptions,
}

impl PgnETL {
    pub fn new() -> Self {
        Self { opts: ScanOptions::default() }
    }

    // -------- Builder methods --------
    pub fn time_controls<I, S>(mut self, tcs: I) -> Self where I: IntoIterator<Item = S>, S: Into<String> { self.opts = self.opts.with_time_controls(tcs); self }
    pub fn rating_ceiling(mut self, ceiling: u32) -> Self { self.opts = self.opts.with_rating_ceiling(ceiling); self }
    pub fn min_games(mut self, n: u64) -> Self { self.opts = self.opts.with_min_games(n); self }
    pub fn sample_size(mut self, n: usize) -> Self { self.opts = self.opts.with_sample_size(n); self }
    pub fn seed(mut self, seed: u64) -> Self { self.opts = self.opts.with_seed(seed); self }
    pub fn require_timestamps(mut self, yes: bool) -> Self { self.opts = self.opts.with_require_timestamps(yes); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }
    pub fn progress_every_lines(mut self, lines: u64) -> Self { self.opts = self.opts.with_progress_every_lines(lines); self }
    pub fn io_read_buffer(mut self, bytes: usize) -> Self { self.opts = self.opts.with_io_read_buffer(bytes); self }

    /// Single-pass scan of one monthly archive: stream, tokenize, accumulate
    /// headers, aggregate player stats. All-or-nothing: any read or decode
    /// fault aborts with a [`ScanDiagnostics`] snapshot attached to the error
    /// chain; there is no checkpoint/resume.
    pub fn scan_stats(&self, input: &Path) -> Result<ScanReport> {
        init_tracing_once();
        let start = Instant::now();

        let mut acc = HeaderAccumulator::new();
        let mut agg = StatsAggregator::new(&self.opts);
        let mut lines: u64 = 0;
        let mut games: u64 = 0;
        let mut last_line = String::new();

        let pb = if self.opts.progress {
            Some(make_progress_bar_labeled(
                compressed_size(input),
                self.opts.progress_label.as_deref().or(Some("Scanning player stats")),
            ))
        } else {
            None
        };

        let cadence = self.opts.progress_every_lines;
        let read_buf = self.opts.read_buffer_bytes;

        let mut on_line = |line: &str| -> Result<()> {
            lines += 1;
            if let Some(done) = acc.feed(&classify_line(line)) {
                games += 1;
                agg.observe(&done);
            }
            last_line.clear();
            last_line.push_str(line);
            if cadence > 0 && lines % cadence == 0 {
                let note = format!(
                    "Processed ~{} games in {} (line {})",
                    games,
                    format_elapsed(start.elapsed()),
                    lines
                );
                match &pb {
                    Some(pb) => pb.set_message(note),
                    None => tracing::info!("{}", note),
                }
            }
            Ok(())
        };

        let res = match &pb {
            Some(pb) => {
                let bar = pb.clone();
                for_each_line_with_progress_cfg(input, read_buf, |delta| bar.inc(delta), &mut on_line)
            }
            None => for_each_line_cfg(input, read_buf, &mut on_line),
        };
        drop(on_line);

        if let Err(e) = res {
            if let Some(pb) = &pb {
                pb.abandon();
            }
            let diag = ScanDiagnostics {
                line_number: lines + 1,
                last_line,
                open_header: acc.open_header().cloned(),
            };
            tracing::error!("{}", diag);
            return Err(e.context(diag));
        }

        // The final game of the archive is never followed by another start
        // marker; flush it here or it is silently dropped.
        if let Some(done) = acc.finish() {
            games += 1;
            agg.observe(&done);
        }

        let elapsed = start.elapsed();
        if let Some(pb) = pb {
            pb.finish_with_message(format!(
                "Scan complete: {} games in {}",
                games,
                format_elapsed(elapsed)
            ));
        }
        tracing::info!(
            "scan complete: {} games, {} lines, {} distinct players, {}",
            games,
            lines,
            agg.distinct_players(),
            format_elapsed(elapsed)
        );

        Ok(ScanReport {
            games_scanned: games,
            lines_read: lines,
            distinct_players: agg.distinct_players(),
            table: agg.into_table(),
            elapsed,
        })
    }

    /// Sample the grinders out of a finished scan and write the CSV. Write
    /// faults surface with their own context and leave `report` untouched, so
    /// the caller can retry against another path.
    pub fn write_player_sample(&self, report: &ScanReport, out_path: &Path) -> Result<SampleSummary> {
        let grinders = report
            .table
            .values()
            .filter(|s| s.games >= self.opts.min_games && s.min_rating.is_some())
            .count();

        let rows = sample_grinders(
            &report.table,
            self.opts.min_games,
            self.opts.sample_size,
            self.opts.seed,
        );
        write_sample_csv(out_path, &rows)
            .with_context(|| format!("writing player sample to {}", out_path.display()))?;

        let summary = SampleSummary {
            unique_players: report.table.len(),
            grinders,
            written: rows.len(),
            used_entire_population: grinders <= self.opts.sample_size,
        };
        if summary.used_entire_population {
            tracing::info!(
                "qualifying population ({}) fits inside the requested sample size ({}); using all of it",
                summary.grinders,
                self.opts.sample_size
            );
        }
        tracing::info!(
            "wrote {} players ({} grinders of {} unique) to {}",
            summary.written,
            summary.grinders,
            summary.unique_players,
            out_path.display()
        );
        Ok(summary)
    }

    /// One streaming pass that tallies every TimeControl value in the
    /// archive, for picking a time-control set before committing to a scan.
    pub fn count_time_controls(&self, input: &Path) -> Result<TimeControlCensus> {
        init_tracing_once();
        let pb = if self.opts.progress {
            Some(make_progress_bar_labeled(
                compressed_size(input),
                self.opts.progress_label.as_deref().or(Some("Counting time controls")),
            ))
        } else {
            None
        };
        let census = census_time_controls(input, self.opts.read_buffer_bytes, pb.clone())?;
        if let Some(pb) = pb {
            pb.finish_with_message(format!(
                "Census complete: {} games, {} distinct time controls in {}",
                census.total_games,
                census.counts.len(),
                format_elapsed(census.elapsed)
            ));
        }
        tracing::info!(
            "census complete: {} games, {} distinct time controls, {}",
            census.total_games,
            census.counts.len(),
            format_elapsed(census.elapsed)
        );
        Ok(census)
    }

    /// Archive-to-archive filter: copy through only the games whose
    /// TimeControl is in this scan's accepted set.
    pub fn trim_by_time_control(&self, input: &Path, output: &Path) -> Result<TrimReport> {
        init_tracing_once();
        let pb = if self.opts.progress {
            Some(make_progress_bar_labeled(
                compressed_size(input),
                self.opts.progress_label.as_deref().or(Some("Trimming by time control")),
            ))
        } else {
            None
        };
        let keep: ahash::AHashSet<String> = self.opts.time_controls.iter().cloned().collect();
        let report = trim_archive(input, output, &keep, self.opts.read_buffer_bytes, pb.clone())?;
        if let Some(pb) = pb {
            pb.finish_with_message(format!(
                "Trim complete: kept {} of {} games in {}",
                report.games_kept,
                report.games_scanned,
                format_elapsed(report.elapsed)
            ));
        }
        Ok(report)
    }
}
