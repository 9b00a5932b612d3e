use super::timer::{Capturer, MonsterTimer, TimerError};
use super::normalize;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use std::collections::{BTreeMap, HashSet};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AlertKind {
    Common,
    /// Escalated alert for monsters in the rare set.
    Rare,
}

/// A repop window that just opened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepopAlert {
    pub timer: MonsterTimer,
    pub kind: AlertKind,
}

#[derive(Clone, Debug, Default)]
pub struct SweepReport {
    pub alerts: Vec<RepopAlert>,
    /// Timers removed because their window closed.
    pub expired: Vec<MonsterTimer>,
}

impl SweepReport {
    /// Returns `true` if the sweep changed the registry.
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty() && self.expired.is_empty()
    }
}

/// Holds at most one [`MonsterTimer`] per normalized monster name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimerRegistry {
    timers: BTreeMap<String, MonsterTimer>,
    rare: HashSet<String>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the set of rare monster names. Only affects timers created
    /// afterwards.
    pub fn set_rare<I, T>(&mut self, names: I)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.rare = names.into_iter().map(|n| normalize(n.as_ref())).collect();
    }

    pub fn is_rare(&self, name: &str) -> bool {
        self.rare.contains(&normalize(name))
    }

    /// Registers a capture at `now`. An existing timer for the same monster is
    /// replaced unconditionally and returned.
    pub fn register_capture(
        &mut self,
        name: &str,
        captured_by: Capturer,
        now: DateTime<FixedOffset>,
    ) -> (MonsterTimer, Option<MonsterTimer>) {
        let key = normalize(name);

        let timer = MonsterTimer {
            name: key.clone(),
            display_name: name.split_whitespace().collect::<Vec<_>>().join(" "),
            capture_time: now,
            captured_by,
            is_rare: self.rare.contains(&key),
            alerted: false,
        };

        let previous = self.timers.insert(key, timer.clone());
        (timer, previous)
    }

    /// Looks up the timer of `name`. Timers older than a day are reported as
    /// [`TimerError::Stale`] even when the sweep did not remove them yet.
    pub fn query(
        &self,
        name: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<&MonsterTimer, TimerError> {
        let timer = self.get(name).ok_or(TimerError::NotFound)?;

        if timer.is_stale(now) {
            return Err(TimerError::Stale);
        }

        Ok(timer)
    }

    pub fn get(&self, name: &str) -> Option<&MonsterTimer> {
        self.timers.get(&normalize(name))
    }

    /// Returns all timers whose repop window contains `now`. The order is not
    /// part of the contract; currently they are sorted by window start.
    pub fn list_active(&self, now: DateTime<FixedOffset>) -> Vec<&MonsterTimer> {
        let mut timers: Vec<_> = self.timers.values().filter(|t| t.is_active(now)).collect();
        timers.sort_by(|a, b| a.repop_start().cmp(&b.repop_start()).then(a.name.cmp(&b.name)));
        timers
    }

    /// Returns all timers whose repop window did not open yet, soonest first.
    pub fn upcoming(&self, now: DateTime<FixedOffset>) -> Vec<&MonsterTimer> {
        let mut timers: Vec<_> = self
            .timers
            .values()
            .filter(|t| now < t.repop_start())
            .collect();
        timers.sort_by(|a, b| a.repop_start().cmp(&b.repop_start()).then(a.name.cmp(&b.name)));
        timers
    }

    pub fn delete(&mut self, name: &str) -> Option<MonsterTimer> {
        self.timers.remove(&normalize(name))
    }

    /// Emits an alert for every window that opened and was not alerted yet,
    /// and removes every timer whose window closed before `now`.
    pub fn sweep(&mut self, now: DateTime<FixedOffset>) -> SweepReport {
        let mut report = SweepReport::default();

        // Snapshot the keys, entries are removed while walking them.
        let names: Vec<String> = self.timers.keys().cloned().collect();

        for name in names {
            let expired = match self.timers.get_mut(&name) {
                Some(timer) => {
                    if timer.is_active(now) && !timer.alerted {
                        timer.alerted = true;

                        let kind = match timer.is_rare {
                            true => AlertKind::Rare,
                            false => AlertKind::Common,
                        };

                        report.alerts.push(RepopAlert {
                            timer: timer.clone(),
                            kind,
                        });
                    }

                    timer.is_expired(now)
                }
                None => false,
            };

            if expired {
                if let Some(timer) = self.timers.remove(&name) {
                    report.expired.push(timer);
                }
            }
        }

        report
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonsterTimer> {
        self.timers.values()
    }
}

impl Serialize for TimerRegistry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.timers.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TimerRegistry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, MonsterTimer>::deserialize(deserializer)?;

        // Keys written by hand may not be normalized. If two keys collide the
        // latest capture wins.
        let mut timers = BTreeMap::<String, MonsterTimer>::new();
        for (key, mut timer) in raw {
            let name = normalize(&key);
            if name.is_empty() {
                continue;
            }

            timer.name = name.clone();
            if timer.display_name.is_empty() {
                timer.display_name = key.split_whitespace().collect::<Vec<_>>().join(" ");
            }

            let newer = timers
                .get(&name)
                .map_or(true, |existing| timer.capture_time > existing.capture_time);
            if newer {
                timers.insert(name, timer);
            }
        }

        Ok(Self {
            timers,
            rare: HashSet::new(),
        })
    }
}
