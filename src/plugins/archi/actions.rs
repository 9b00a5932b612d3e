//! The operations behind the archi commands. Every mutation runs inside a
//! single [`Store::write`], a timer and its points never diverge.
use crate::archi::{day_key, Capturer, MemberId, MonsterTimer, TimerError};
use crate::core::store::{self, Store};

use chrono::{DateTime, FixedOffset};

#[derive(Clone, Debug)]
pub struct Registered {
    pub timer: MonsterTimer,
    /// The timer replaced by this capture.
    pub previous: Option<MonsterTimer>,
    /// Points awarded to the capturer, `None` for external captures.
    pub points: Option<i64>,
}

#[derive(Clone, Debug)]
pub struct Deleted {
    pub timer: MonsterTimer,
    /// The member who lost points and the amount.
    pub revoked: Option<(MemberId, i64)>,
}

/// Registers a capture at `now` and credits the capturer for the day of
/// `now`.
pub fn register(
    store: &Store,
    name: &str,
    captured_by: Capturer,
    now: DateTime<FixedOffset>,
) -> store::Result<Registered> {
    store.write(|document| {
        let (timer, previous) = document.archis.register_capture(name, captured_by, now);

        let points = timer
            .captured_by
            .id()
            .map(|member| document.scores.award(member, &day_key(&now), timer.is_rare));

        Registered {
            timer,
            previous,
            points,
        }
    })
}

pub fn query(
    store: &Store,
    name: &str,
    now: DateTime<FixedOffset>,
) -> Result<MonsterTimer, TimerError> {
    store.read(|document| document.archis.query(name, now).cloned())
}

/// Returns the open windows and the windows opening later.
pub fn repops(store: &Store, now: DateTime<FixedOffset>) -> (Vec<MonsterTimer>, Vec<MonsterTimer>) {
    store.read(|document| {
        let active = document.archis.list_active(now).into_iter().cloned().collect();
        let upcoming = document.archis.upcoming(now).into_iter().cloned().collect();
        (active, upcoming)
    })
}

/// Deletes the timer of `name` and takes the capture points back from the
/// day they were awarded on. Captures from before the last weekly reset keep
/// their weekly points. Returns `None` if no timer exists.
pub fn delete(store: &Store, name: &str) -> store::Result<Option<Deleted>> {
    store.write(|document| {
        let timer = document.archis.delete(name)?;

        let revoked = timer
            .captured_by
            .id()
            .map(|member| {
                let scores = &mut document.scores;
                let points = scores.revoke_capture(member, &timer.capture_time, timer.is_rare);
                (member, points)
            })
            .filter(|(_, points)| *points > 0);

        Some(Deleted { timer, revoked })
    })
}

pub fn leaderboard(store: &Store, top_n: usize) -> Vec<(MemberId, i64)> {
    store.read(|document| document.scores.leaderboard(top_n))
}

pub fn daily_total(store: &Store, now: DateTime<FixedOffset>) -> i64 {
    store.read(|document| document.scores.daily_total(&day_key(&now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archi::PointPolicy;

    use chrono::Duration;

    const U1: MemberId = 111;
    const U2: MemberId = 222;

    fn store() -> Store {
        let store = Store::in_memory();
        store.configure(PointPolicy { common: 1, rare: 5 }, ["bulgig"]);
        store
    }

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-01-01T10:00:00+01:00").unwrap()
    }

    #[test]
    fn test_register_rare_capture() {
        let store = store();

        let registered = register(&store, "bulgig", Capturer::member(U1, "Robin"), now()).unwrap();
        assert_eq!(registered.points, Some(5));
        assert!(registered.previous.is_none());
        assert_eq!(
            registered.timer.repop_start().to_rfc3339(),
            "2024-01-01T20:00:00+01:00"
        );
        assert_eq!(
            registered.timer.repop_end().to_rfc3339(),
            "2024-01-02T00:00:00+01:00"
        );

        let timer = query(&store, "BULGIG", now() + Duration::hours(1)).unwrap();
        assert_eq!(timer.captured_by.id(), Some(U1));
        assert_eq!(daily_total(&store, now()), 5);
        assert_eq!(leaderboard(&store, 10), vec![(U1, 5)]);
    }

    #[test]
    fn test_register_external_capture() {
        let store = store();

        let registered = register(&store, "Bouliglours", Capturer::External, now()).unwrap();
        assert_eq!(registered.points, None);
        assert_eq!(registered.timer.captured_by.name(), "external");
        assert_eq!(daily_total(&store, now()), 0);
        assert!(leaderboard(&store, 10).is_empty());
    }

    #[test]
    fn test_register_overwrite_keeps_points() {
        let store = store();

        register(&store, "Bouliglours", Capturer::member(U1, "Robin"), now()).unwrap();
        let registered = register(
            &store,
            "bouliglours",
            Capturer::member(U2, "Batman"),
            now() + Duration::hours(2),
        )
        .unwrap();

        assert_eq!(registered.previous.unwrap().captured_by.id(), Some(U1));
        assert_eq!(leaderboard(&store, 10), vec![(U1, 1), (U2, 1)]);
    }

    #[test]
    fn test_query_errors() {
        let store = store();
        assert_eq!(
            query(&store, "bulgig", now()).unwrap_err(),
            TimerError::NotFound
        );

        register(&store, "bulgig", Capturer::External, now()).unwrap();
        assert_eq!(
            query(&store, "bulgig", now() + Duration::hours(25)).unwrap_err(),
            TimerError::Stale
        );
    }

    #[test]
    fn test_repops() {
        let store = store();
        register(&store, "bulgig", Capturer::External, now()).unwrap();
        register(
            &store,
            "Bouliglours",
            Capturer::External,
            now() + Duration::hours(2),
        )
        .unwrap();

        let (active, upcoming) = repops(&store, now() + Duration::hours(11));
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "bulgig");
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].name, "bouliglours");
    }

    #[test]
    fn test_delete_revokes_points() {
        let store = store();

        register(&store, "bulgig", Capturer::member(U1, "Robin"), now()).unwrap();
        register(&store, "Bouliglours", Capturer::member(U1, "Robin"), now()).unwrap();

        let deleted = delete(&store, " BULGIG ").unwrap().unwrap();
        assert_eq!(deleted.revoked, Some((U1, 5)));
        assert_eq!(daily_total(&store, now()), 1);
        assert_eq!(leaderboard(&store, 10), vec![(U1, 1)]);

        delete(&store, "bouliglours").unwrap().unwrap();
        assert!(leaderboard(&store, 10).is_empty());
        assert!(store.read(|d| d.scores.daily.is_empty()));

        assert!(delete(&store, "bulgig").unwrap().is_none());
    }

    #[test]
    fn test_delete_external_capture() {
        let store = store();
        register(&store, "bulgig", Capturer::External, now()).unwrap();

        let deleted = delete(&store, "bulgig").unwrap().unwrap();
        assert_eq!(deleted.revoked, None);
    }

    #[test]
    fn test_delete_after_weekly_reset() {
        let store = store();

        register(&store, "bulgig", Capturer::member(U1, "Robin"), now()).unwrap();
        store
            .write(|d| d.scores.reset_weekly(now() + Duration::hours(1)))
            .unwrap();
        register(
            &store,
            "Bouliglours",
            Capturer::member(U1, "Robin"),
            now() + Duration::hours(2),
        )
        .unwrap();

        // The week that counted the capture is already closed.
        let deleted = delete(&store, "bulgig").unwrap().unwrap();
        assert_eq!(deleted.revoked, None);
        assert_eq!(leaderboard(&store, 10), vec![(U1, 1)]);
        assert_eq!(daily_total(&store, now()), 1);
    }

    #[test]
    fn test_register_failed_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("missing").join("archis.json")).unwrap();
        store.configure(PointPolicy { common: 1, rare: 5 }, ["bulgig"]);

        for _ in 0..2 {
            assert!(register(&store, "bulgig", Capturer::member(U1, "Robin"), now()).is_err());
        }

        assert!(leaderboard(&store, 10).is_empty());
        assert_eq!(daily_total(&store, now()), 0);
        assert_eq!(
            query(&store, "bulgig", now()).unwrap_err(),
            TimerError::NotFound
        );
    }
}
