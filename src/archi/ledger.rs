use super::MemberId;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Points awarded per capture.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointPolicy {
    pub common: i64,
    pub rare: i64,
}

impl PointPolicy {
    pub fn points(&self, is_rare: bool) -> i64 {
        match is_rare {
            true => self.rare,
            false => self.common,
        }
    }
}

impl Default for PointPolicy {
    fn default() -> Self {
        Self { common: 1, rare: 5 }
    }
}

/// Capture points per member, per day and for the running week.
///
/// Counts are always positive: an entry that drops to zero or below is
/// removed, so members without points never show up in leaderboards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLedger {
    #[serde(default)]
    pub daily: BTreeMap<String, BTreeMap<MemberId, i64>>,
    #[serde(default)]
    pub weekly: BTreeMap<MemberId, i64>,
    /// Time of the last weekly reset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_start: Option<DateTime<FixedOffset>>,
    #[serde(skip)]
    policy: PointPolicy,
}

impl ScoreLedger {
    pub fn new(policy: PointPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    pub fn policy(&self) -> PointPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: PointPolicy) {
        self.policy = policy;
    }

    /// Awards the points of a single capture to `member` and returns them.
    pub fn award(&mut self, member: MemberId, day: &str, is_rare: bool) -> i64 {
        let points = self.policy.points(is_rare);

        let daily = self.daily.entry(day.to_owned()).or_default();
        add(daily, member, points);
        if daily.is_empty() {
            self.daily.remove(day);
        }

        add(&mut self.weekly, member, points);

        points
    }

    /// Takes back the points of a single capture from `member` and returns
    /// them. Entries reaching zero are removed, not clamped.
    pub fn revoke(&mut self, member: MemberId, day: &str, is_rare: bool) -> i64 {
        let points = self.revoke_daily(member, day, is_rare);
        add(&mut self.weekly, member, -points);

        points
    }

    /// Like [`revoke`] for a capture made at `captured_at`. Captures older than
    /// the last weekly reset only correct their day and return `0`.
    ///
    /// [`revoke`]: Self::revoke
    pub fn revoke_capture(
        &mut self,
        member: MemberId,
        captured_at: &DateTime<FixedOffset>,
        is_rare: bool,
    ) -> i64 {
        let day = super::day_key(captured_at);

        match self.week_start {
            Some(start) if *captured_at < start => {
                self.revoke_daily(member, &day, is_rare);
                0
            }
            _ => self.revoke(member, &day, is_rare),
        }
    }

    fn revoke_daily(&mut self, member: MemberId, day: &str, is_rare: bool) -> i64 {
        let points = self.policy.points(is_rare);

        if let Some(daily) = self.daily.get_mut(day) {
            add(daily, member, -points);
            if daily.is_empty() {
                self.daily.remove(day);
            }
        }

        points
    }

    /// Returns the `top_n` best members of the week. Equal counts are ordered
    /// by member id.
    pub fn leaderboard(&self, top_n: usize) -> Vec<(MemberId, i64)> {
        let mut entries: Vec<_> = self.weekly.iter().map(|(m, c)| (*m, *c)).collect();
        entries.sort_by(rank);
        entries.truncate(top_n);
        entries
    }

    /// Returns the best member of the week, `None` if nobody scored.
    pub fn winner(&self) -> Option<(MemberId, i64)> {
        self.weekly
            .iter()
            .map(|(m, c)| (*m, *c))
            .min_by(rank)
    }

    pub fn daily_total(&self, day: &str) -> i64 {
        self.daily
            .get(day)
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }

    /// Clears the weekly counts and returns them. `now` starts the new week.
    pub fn reset_weekly(&mut self, now: DateTime<FixedOffset>) -> BTreeMap<MemberId, i64> {
        self.week_start = Some(now);
        std::mem::take(&mut self.weekly)
    }

    /// Drops all days sorting before `day`. Returns the number of removed days.
    pub fn prune_daily(&mut self, day: &str) -> usize {
        let before = self.daily.len();
        self.daily = self.daily.split_off(day);
        before - self.daily.len()
    }
}

/// Adds `points` to the entry of `member`, removing it if it is no longer
/// positive.
fn add(counts: &mut BTreeMap<MemberId, i64>, member: MemberId, points: i64) {
    let count = counts.get(&member).copied().unwrap_or(0) + points;

    if count > 0 {
        counts.insert(member, count);
    } else {
        counts.remove(&member);
    }
}

/// Orders by count descending, then by member id ascending.
fn rank(a: &(MemberId, i64), b: &(MemberId, i64)) -> Ordering {
    b.1.cmp(&a.1).then(a.0.cmp(&b.0))
}
