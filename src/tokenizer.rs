//! Line classification for PGN header scanning: game-start marker, header tag,
//! or ignorable (blank lines, movetext). Pure: no state, no side effects.

use regex::Regex;
use std::sync::OnceLock;

/// The reserved tag that opens every PGN game record.
pub const START_TAG: &str = "Event";

/// Anchored `[Name "Value"]` matcher. The value is matched greedily up to the
/// last quote on the line, so embedded quotes survive (last-quote-terminated,
/// mirroring how the monthly dumps are actually written).
fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\[(\w+)\s+"(.+)"\]$"#).unwrap())
}

/// Matcher for the start of a movetext section, e.g. `1. e4 e5 ...`.
/// Used by the archive trimmer to detect end-of-header.
fn moves_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.").unwrap())
}

/// Classification of a single newline-stripped line.
#[derive(Debug, PartialEq, Eq)]
pub enum LineClass<'a> {
    /// `[Event "..."]`: opens a new game record.
    GameStart { name: &'a str, value: &'a str },
    /// Any other `[Name "Value"]` header tag.
    Tag { name: &'a str, value: &'a str },
    /// Blank lines, movetext, malformed tags: ignored by the accumulator.
    Other,
}

/// Classify one line. Malformed bracket lines (e.g. an unterminated value)
/// fall through to `Other` rather than erroring; a bad single record must
/// never abort the scan.
pub fn classify_line(line: &str) -> LineClass<'_> {
    // Cheap reject before the regex runs: header tags always start with '['.
    if !line.starts_with('[') {
        return LineClass::Other;
    }
    match tag_re().captures(line) {
        Some(caps) => {
            let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let value = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            if name == START_TAG {
                LineClass::GameStart { name, value }
            } else {
                LineClass::Tag { name, value }
            }
        }
        None => LineClass::Other,
    }
}

/// True if the line begins a movetext section.
pub fn is_moves_start(line: &str) -> bool {
    moves_re().is_match(line)
}
