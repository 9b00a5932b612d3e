//! # Archi
//! Repop timers of archimonsters and the capture score ledger.
//!
//! Everything in this module is independent of the chat platform. Handlers
//! pass the current time explicitly, which keeps the time arithmetic testable.
pub mod ledger;
pub mod registry;
pub mod timer;

pub use ledger::{PointPolicy, ScoreLedger};
pub use registry::{AlertKind, RepopAlert, SweepReport, TimerRegistry};
pub use timer::{Capturer, MonsterTimer, TimerError};

use chrono::{DateTime, TimeZone};

/// The discord id of a guild member.
pub type MemberId = u64;

/// Normalizes a monster name into its registry key. Surrounding whitespace is
/// removed, inner whitespace collapsed to single spaces and the name is
/// lower-cased.
pub fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Returns the ledger day key (`YYYY-MM-DD`) of `datetime` in its own zone.
pub fn day_key<Tz>(datetime: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    datetime.format("%Y-%m-%d").to_string()
}
