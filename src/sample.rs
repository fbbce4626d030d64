//! Threshold filter, uniform sampling without replacement, and the CSV writer.
//!
//! The column order and names below are a contract: the downstream
//! correlation/plotting scripts address them positionally and by header, so
//! changing them is a breaking change.

use crate::aggregate::{PlayerStats, PlayerTable};
use anyhow::{Context, Result};
use rand::rngs::SmallRng;
use rand::{seq::index, SeedableRng};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::util::{create_with_backoff, replace_file_atomic};

/// Fixed header row of the output table.
pub const CSV_HEADER: &str =
    "Username,Games,Min_Rating,Max_Rating,Avg_Rating,Earliest_Rating,Latest_Rating";

/// Filter the table down to grinders (players at or above `min_games` with at
/// least one successful rating contribution) and draw at most `sample_size`
/// of them uniformly at random without replacement.
///
/// Candidates are name-sorted before the draw so a fixed seed yields the same
/// sample regardless of hash-map iteration order. When the population fits
/// inside `sample_size` the whole population is returned, in name order;
/// that is a normal outcome, not an error.
pub fn sample_grinders<'a>(
    table: &'a PlayerTable,
    min_games: u64,
    sample_size: usize,
    seed: Option<u64>,
) -> Vec<(&'a str, &'a PlayerStats)> {
    let mut grinders: Vec<(&str, &PlayerStats)> = table
        .iter()
        .filter(|(_, s)| s.games >= min_games && s.min_rating.is_some())
        .map(|(name, s)| (name.as_str(), s))
        .collect();
    grinders.sort_by_key(|(name, _)| *name);

    if grinders.len() <= sample_size {
        return grinders;
    }

    let mut rng = match seed {
        Some(s) => SmallRng::seed_from_u64(s),
        None => SmallRng::from_entropy(),
    };
    index::sample(&mut rng, grinders.len(), sample_size)
        .into_iter()
        .map(|i| grinders[i])
        .collect()
}

fn format_row(name: &str, s: &PlayerStats) -> String {
    let opt_u32 = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_default();
    let avg = s.avg_rating().map(|a| format!("{:.2}", a)).unwrap_or_default();
    format!(
        "{},{},{},{},{},{},{}",
        name,
        s.games,
        opt_u32(s.min_rating),
        opt_u32(s.max_rating),
        avg,
        opt_u32(s.earliest.map(|(_, r)| r)),
        opt_u32(s.latest.map(|(_, r)| r)),
    )
}

/// Serialize the sampled rows as CSV. Written to a sibling tmp file and moved
/// into place atomically, so a failed write never leaves a truncated table at
/// `out_path`. An empty sample still produces the header row: downstream can
/// tell "no qualifying players" from "missing column" that way.
pub fn write_sample_csv(out_path: &Path, rows: &[(&str, &PlayerStats)]) -> Result<()> {
    let tmp = out_path.with_extension("tmp");
    {
        let f = create_with_backoff(&tmp, 16, 50)
            .with_context(|| format!("creating sample output {}", tmp.display()))?;
        let mut w = BufWriter::new(f);
        writeln!(w, "{}", CSV_HEADER).context("writing sample output")?;
        for (name, stats) in rows {
            writeln!(w, "{}", format_row(name, stats)).context("writing sample output")?;
        }
        w.flush().context("writing sample output")?;
    }
    replace_file_atomic(&tmp, out_path)
        .with_context(|| format!("publishing sample output {}", out_path.display()))
}
