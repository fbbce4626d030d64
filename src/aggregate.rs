//! Per-player running statistics over completed game headers.
//! The table is exclusively owned by one `StatsAggregator` for the lifetime
//! of a scan; no global state, no concurrent mutation.

use crate::config::ScanOptions;
use crate::header::GameHeader;
use ahash::{AHashMap, AHashSet};

/// Running stats for one player. All fields move monotonically for the
/// duration of a scan: counts only grow, extrema only widen, the time bounds
/// only spread. `None` means "no contribution yet", no infinity sentinels.
#[derive(Clone, Debug, Default)]
pub struct PlayerStats {
    pub games: u64,
    pub min_rating: Option<u32>,
    pub max_rating: Option<u32>,
    pub rating_sum: u64,
    pub rating_count: u64,
    /// `(unix_timestamp, rating)` at the earliest-seen game.
    pub earliest: Option<(i64, u32)>,
    /// `(unix_timestamp, rating)` at the latest-seen game.
    pub latest: Option<(i64, u32)>,
}

impl PlayerStats {
    /// Arithmetic mean rating across contributions, if any exist.
    pub fn avg_rating(&self) -> Option<f64> {
        (self.rating_count > 0).then(|| self.rating_sum as f64 / self.rating_count as f64)
    }

    fn credit(&mut self, rating: u32, ts: Option<i64>) {
        self.games += 1;
        self.min_rating = Some(self.min_rating.map_or(rating, |m| m.min(rating)));
        self.max_rating = Some(self.max_rating.map_or(rating, |m| m.max(rating)));
        self.rating_sum += u64::from(rating);
        self.rating_count += 1;
        if let Some(t) = ts {
            match self.earliest {
                Some((et, _)) if t >= et => {}
                _ => self.earliest = Some((t, rating)),
            }
            match self.latest {
                Some((lt, _)) if t <= lt => {}
                _ => self.latest = Some((t, rating)),
            }
        }
    }
}

/// Player name -> running stats. The scan's dominant memory cost: grows with
/// the number of distinct qualifying players, never with archive size.
pub type PlayerTable = AHashMap<String, PlayerStats>;

/// Parse a side rating. Missing, non-numeric, or non-positive values are all
/// "absent"; the monthly dumps use `"?"` for unrated sides.
pub fn parse_rating(raw: Option<&str>) -> Option<u32> {
    let n: i64 = raw?.trim().parse().ok()?;
    (n > 0).then(|| n as u32)
}

/// Consumes completed headers and maintains the player table.
pub struct StatsAggregator {
    time_controls: AHashSet<String>,
    rating_ceiling: u32,
    require_timestamps: bool,
    table: PlayerTable,
}

impl StatsAggregator {
    pub fn new(opts: &ScanOptions) -> Self {
        Self {
            time_controls: opts.time_controls.iter().cloned().collect(),
            rating_ceiling: opts.rating_ceiling,
            require_timestamps: opts.require_timestamps,
            table: PlayerTable::new(),
        }
    }

    /// Apply the inclusion filters and fold one game into the table.
    /// Malformed fields degrade to "that side is excluded this game";
    /// nothing here errors.
    ///
    /// NOTE: qualification is an inclusive-OR across sides: a player above
    /// the ceiling still gets counted when their opponent is under it. The
    /// original extractor shipped with this behavior and existing correlation
    /// outputs depend on it, so it is kept rather than corrected.
    pub fn observe(&mut self, header: &GameHeader) {
        let Some(tc) = header.time_control.as_deref() else { return };
        if !self.time_controls.contains(tc) {
            return;
        }

        let white = parse_rating(header.white_elo.as_deref());
        let black = parse_rating(header.black_elo.as_deref());
        let under = |r: Option<u32>| r.is_some_and(|r| r <= self.rating_ceiling);
        if !under(white) && !under(black) {
            return;
        }

        let ts = header.timestamp();
        if self.require_timestamps && ts.is_none() {
            return;
        }

        if let (Some(name), Some(rating)) = (header.white.as_deref(), white) {
            self.table.entry(name.to_string()).or_default().credit(rating, ts);
        }
        if let (Some(name), Some(rating)) = (header.black.as_deref(), black) {
            self.table.entry(name.to_string()).or_default().credit(rating, ts);
        }
    }

    /// Number of distinct players seen so far.
    pub fn distinct_players(&self) -> usize {
        self.table.len()
    }

    pub fn into_table(self) -> PlayerTable {
        self.table
    }
}
