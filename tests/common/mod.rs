#![allow(dead_code)]

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// One synthetic PGN game: bracketed header tags, a blank line, a movetext
/// line, and a trailing blank line, the shape of the monthly dumps but tiny.
pub fn game_text(tags: &[(&str, &str)]) -> String {
    let mut s = String::new();
    for (name, value) in tags {
        s.push_str(&format!("[{} \"{}\"]\n", name, value));
    }
    s.push('\n');
    s.push_str("1. e4 e5 2. Nf3 Nc6 1-0\n");
    s.push('\n');
    s
}

/// A standard rated game with the tags the engine consumes.
pub fn standard_game(
    white: &str,
    black: &str,
    white_elo: &str,
    black_elo: &str,
    time_control: &str,
    utc_date: &str,
    utc_time: &str,
) -> String {
    game_text(&[
        ("Event", "Rated Rapid game"),
        ("Site", "https://lichess.org/abcd1234"),
        ("White", white),
        ("Black", black),
        ("Result", "1-0"),
        ("WhiteElo", white_elo),
        ("BlackElo", black_elo),
        ("TimeControl", time_control),
        ("UTCDate", utc_date),
        ("UTCTime", utc_time),
    ])
}

/// Write a compressed `.pgn.zst` archive from pre-rendered game blocks.
pub fn write_zst_pgn(path: &Path, games: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let f = File::create(path).unwrap();
    let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
    for g in games {
        enc.write_all(g.as_bytes()).unwrap();
    }
    enc.finish().unwrap();
}

/// Fresh temp dir that lives for the whole test (leaked on purpose).
pub fn scratch_dir() -> PathBuf {
    tempfile::tempdir().unwrap().into_path()
}

/// Read a text file line-by-line into strings, keeping empty lines out.
pub fn read_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    let r = BufReader::new(f);
    r.lines().map(|l| l.unwrap()).filter(|s| !s.is_empty()).collect()
}

/// Decompress a `.zst` file and collect its lines, including empty ones
/// (PGN block structure is whitespace-sensitive).
pub fn decompress_zst_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    let dec = zstd::stream::read::Decoder::new(f).unwrap();
    let r = BufReader::new(dec);
    r.lines().map(|l| l.unwrap()).collect()
}
