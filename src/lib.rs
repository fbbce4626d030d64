mod aggregate;
mod census;
mod config;
mod header;
mod pipeline;
mod progress;
mod sample;
mod tokenizer;
mod trim;
mod util;
mod zstd_pgn;

pub use crate::aggregate::{parse_rating, PlayerStats, PlayerTable, StatsAggregator};
pub use crate::census::{write_census_csv, TimeControlCensus, CENSUS_CSV_HEADER};
pub use crate::config::ScanOptions;
pub use crate::header::{GameHeader, HeaderAccumulator};
pub use crate::pipeline::{PgnETL, SampleSummary, ScanDiagnostics, ScanReport};
pub use crate::sample::{sample_grinders, write_sample_csv, CSV_HEADER};
pub use crate::tokenizer::{classify_line, is_moves_start, LineClass, START_TAG};
pub use crate::trim::TrimReport;

// Expose the streaming line loop and integrity validators for callers that
// build their own per-line passes over a monthly archive.
pub use crate::zstd_pgn::{for_each_line_cfg, quick_validate, validate_full};

// Expose tracing init and the elapsed-time formatter for binaries.
pub use crate::util::{format_elapsed, init_tracing_once};
