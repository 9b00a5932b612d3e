use super::MemberId;

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hours between a capture and the start of the repop window.
pub const REPOP_START_HOURS: i64 = 10;
/// Hours between a capture and the end of the repop window.
pub const REPOP_END_HOURS: i64 = 14;
/// Timers older than this are hidden from queries even if not swept yet.
pub const STALE_AFTER_HOURS: i64 = 24;

/// The reporter name stored for captures by non-members.
const EXTERNAL: &str = "external";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("no timer known for this archimonster")]
    NotFound,
    #[error("timer is older than {} hours", STALE_AFTER_HOURS)]
    Stale,
}

/// Who reported a capture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Capturer {
    Member { id: MemberId, name: String },
    /// Captured by someone outside of the guild.
    External,
}

impl Capturer {
    pub fn member<T>(id: MemberId, name: T) -> Self
    where
        T: ToString,
    {
        Self::Member {
            id,
            name: name.to_string(),
        }
    }

    /// Returns the member id, `None` for external captures.
    pub fn id(&self) -> Option<MemberId> {
        match self {
            Self::Member { id, .. } => Some(*id),
            Self::External => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Member { name, .. } => name,
            Self::External => EXTERNAL,
        }
    }
}

/// The last known capture of an archimonster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TimerRecord", into = "TimerRecord")]
pub struct MonsterTimer {
    /// Normalized name, the registry key.
    pub name: String,
    /// The name as typed by the reporter.
    pub display_name: String,
    pub capture_time: DateTime<FixedOffset>,
    pub captured_by: Capturer,
    pub is_rare: bool,
    /// Set once the repop alert went out.
    pub alerted: bool,
}

impl MonsterTimer {
    pub fn repop_start(&self) -> DateTime<FixedOffset> {
        self.capture_time + Duration::hours(REPOP_START_HOURS)
    }

    pub fn repop_end(&self) -> DateTime<FixedOffset> {
        self.capture_time + Duration::hours(REPOP_END_HOURS)
    }

    /// Returns `true` if `now` lies inside the repop window (bounds included).
    pub fn is_active(&self, now: DateTime<FixedOffset>) -> bool {
        self.repop_start() <= now && now <= self.repop_end()
    }

    /// Returns `true` once the repop window closed.
    pub fn is_expired(&self, now: DateTime<FixedOffset>) -> bool {
        now > self.repop_end()
    }

    pub fn is_stale(&self, now: DateTime<FixedOffset>) -> bool {
        now - self.capture_time > Duration::hours(STALE_AFTER_HOURS)
    }
}

/// The persisted form of a [`MonsterTimer`]. The name is the key of the
/// surrounding map and is filled in by the registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct TimerRecord {
    #[serde(default)]
    display_name: String,
    time: DateTime<FixedOffset>,
    reporter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reporter_id: Option<MemberId>,
    #[serde(default)]
    rare: bool,
    #[serde(default)]
    alerted: bool,
}

impl From<TimerRecord> for MonsterTimer {
    fn from(record: TimerRecord) -> Self {
        let captured_by = match record.reporter_id {
            Some(id) => Capturer::Member {
                id,
                name: record.reporter,
            },
            None => Capturer::External,
        };

        Self {
            name: String::new(),
            display_name: record.display_name,
            capture_time: record.time,
            captured_by,
            is_rare: record.rare,
            alerted: record.alerted,
        }
    }
}

impl From<MonsterTimer> for TimerRecord {
    fn from(timer: MonsterTimer) -> Self {
        Self {
            display_name: timer.display_name,
            time: timer.capture_time,
            reporter: timer.captured_by.name().to_owned(),
            reporter_id: timer.captured_by.id(),
            rare: timer.is_rare,
            alerted: timer.alerted,
        }
    }
}
