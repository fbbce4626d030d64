use anyhow::Result;
use pgnetl::{format_elapsed, PgnETL};
use std::path::PathBuf;

const ZST_FILE_PATH: &str = "./data/lichess_db_standard_rated_2024-01.pgn.zst";
const OUTPUT_FILE_PATH: &str = "./target_players_stats_rapid_2024_january.csv";

fn main() -> Result<()> {
    let input = PathBuf::from(ZST_FILE_PATH);
    let output = PathBuf::from(OUTPUT_FILE_PATH);

    let etl = PgnETL::new()
        .time_controls(["600+0", "600+5", "900+10"])
        .rating_ceiling(1000)
        .min_games(15)
        .sample_size(5000)
        .progress(true)
        .progress_label("Scanning January 2024");

    let report = etl.scan_stats(&input)?;
    println!(
        "Scan complete. Processed a total of {} games in {}.",
        report.games_scanned,
        format_elapsed(report.elapsed)
    );
    println!("Total unique players found: {}", report.distinct_players);

    let summary = etl.write_player_sample(&report, &output)?;
    println!("Players passing the activity threshold: {}", summary.grinders);
    if summary.used_entire_population {
        println!("Note: fewer qualifying players than the target sample size. Using all of them.");
    }
    println!(
        "Sampled {} players with full stats. Data saved to: {}",
        summary.written,
        output.display()
    );

    Ok(())
}
