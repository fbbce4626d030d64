//! Game header record and the two-state accumulator that assembles one header
//! per game from the classified line stream.

use crate::tokenizer::LineClass;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, PrimitiveDateTime, Time};

const DATE_FMT: &[FormatItem<'static>] = format_description!("[year].[month].[day]");
const TIME_FMT: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second]");

/// Fixed-shape record of the header tags this engine consumes.
/// Unknown tags are dropped at ingest; a repeated tag overwrites (last wins).
/// Ratings stay raw strings here; the aggregator owns the fallible parse.
#[derive(Clone, Debug, Default)]
pub struct GameHeader {
    pub event: Option<String>,
    pub time_control: Option<String>,
    pub white: Option<String>,
    pub black: Option<String>,
    pub white_elo: Option<String>,
    pub black_elo: Option<String>,
    pub utc_date: Option<String>,
    pub utc_time: Option<String>,
}

impl GameHeader {
    fn set_tag(&mut self, name: &str, value: &str) {
        let slot = match name {
            "Event" => &mut self.event,
            "TimeControl" => &mut self.time_control,
            "White" => &mut self.white,
            "Black" => &mut self.black,
            "WhiteElo" => &mut self.white_elo,
            "BlackElo" => &mut self.black_elo,
            "UTCDate" => &mut self.utc_date,
            "UTCTime" => &mut self.utc_time,
            _ => return,
        };
        *slot = Some(value.to_string());
    }

    /// Combine `UTCDate` + `UTCTime` into a unix timestamp. `UTCDate` is
    /// required; a missing `UTCTime` defaults to midnight. Unparsable values
    /// yield `None`; absence of a timestamp is a data-quality condition,
    /// not an error.
    pub fn timestamp(&self) -> Option<i64> {
        let date = Date::parse(self.utc_date.as_deref()?, DATE_FMT).ok()?;
        let tod = match self.utc_time.as_deref() {
            Some(s) => Time::parse(s, TIME_FMT).ok()?,
            None => Time::MIDNIGHT,
        };
        Some(PrimitiveDateTime::new(date, tod).assume_utc().unix_timestamp())
    }
}

/// Two-state machine: idle (no game open) or open (one header accumulating).
/// A game-start marker emits the previously open header, if any, before the
/// new one begins with the marker's own tag as its first entry. Tag lines
/// seen while idle are ignored so that emitted headers map one-to-one onto
/// start markers.
#[derive(Debug, Default)]
pub struct HeaderAccumulator {
    open: Option<GameHeader>,
}

impl HeaderAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one classified line; returns a completed header when the line
    /// closes the previous game.
    pub fn feed(&mut self, class: &LineClass<'_>) -> Option<GameHeader> {
        match class {
            LineClass::GameStart { name, value } => {
                let done = self.open.take();
                let mut fresh = GameHeader::default();
                fresh.set_tag(name, value);
                self.open = Some(fresh);
                done
            }
            LineClass::Tag { name, value } => {
                if let Some(h) = self.open.as_mut() {
                    h.set_tag(name, value);
                }
                None
            }
            LineClass::Other => None,
        }
    }

    /// End of stream: emit the still-open header exactly once. The final game
    /// of an archive is never followed by another start marker, so skipping
    /// this flush would drop it.
    pub fn finish(&mut self) -> Option<GameHeader> {
        self.open.take()
    }

    /// Snapshot of the currently open (incomplete) header, for diagnostics.
    pub fn open_header(&self) -> Option<&GameHeader> {
        self.open.as_ref()
    }
}
