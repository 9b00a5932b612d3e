use super::broadcast::{broadcast, Delivery};
use super::{format, LEADERBOARD_SIZE};
use crate::archi::{day_key, MemberId, SweepReport};
use crate::bot::prelude::*;
use crate::config::{Announce, Cycle};
use crate::core::chat::ChatApi;
use crate::core::store::{self, Store};

use chrono::{DateTime, Datelike, Duration, FixedOffset};

/// Alerts on opened repop windows and drops closed ones.
pub async fn sweep(ctx: TaskContext) -> Result {
    let state = &ctx.state;

    run_sweep(state.store(), state.now(), &ctx.raw_ctx, &state.config.announce).await?;
    Ok(())
}

pub async fn run_sweep<C>(
    store: &Store,
    now: DateTime<FixedOffset>,
    chat: &C,
    announce: &Announce,
) -> store::Result<SweepReport>
where
    C: ChatApi,
{
    // Nothing is posted when the snapshot fails. The sweep is rolled back and
    // the next run alerts again.
    let report = match store.write(|document| document.archis.sweep(now)) {
        Ok(report) => report,
        Err(err) => {
            log::error!("[STORE] Failed to save state after sweep: {}", err);
            return Err(err);
        }
    };

    for timer in &report.expired {
        log::info!("[TASK] Repop window of '{}' closed", timer.display_name);
    }

    for alert in &report.alerts {
        log::info!("[TASK] Repop window of '{}' opened", alert.timer.display_name);

        let content = format::alert(alert);
        let deliveries = broadcast(chat, &announce.channels, announce.mode, &content).await;

        if !deliveries.iter().any(Delivery::is_sent) {
            log::error!(
                "[TASK] Repop alert for '{}' reached no channel",
                alert.timer.display_name
            );
        }
    }

    Ok(report)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Today is not a cycle day.
    Skipped,
    /// Nobody scored this week.
    Empty,
    Awarded {
        winner: (MemberId, i64),
        standings: Vec<(MemberId, i64)>,
    },
}

/// Prunes old daily counts and, on cycle days, crowns the best member of the
/// week and starts a new week.
pub async fn cycle(ctx: TaskContext) -> Result {
    let state = &ctx.state;

    let outcome = run_cycle(
        state.store(),
        state.now(),
        &ctx.raw_ctx,
        &state.config.cycle,
        &state.config.announce,
    )
    .await?;

    log::debug!("[TASK] Cycle finished: {:?}", outcome);
    Ok(())
}

pub async fn run_cycle<C>(
    store: &Store,
    now: DateTime<FixedOffset>,
    chat: &C,
    cycle: &Cycle,
    announce: &Announce,
) -> store::Result<CycleOutcome>
where
    C: ChatApi,
{
    let cutoff = day_key(&(now - Duration::days(cycle.retention_days.into())));
    let is_cycle_day = cycle.weekdays.is_empty() || cycle.weekdays.contains(&now.weekday());

    // Selecting the winner and clearing the week happen under one lock, a
    // capture is either counted for this week or the next one.
    let saved = store.write(|document| {
        let pruned = document.scores.prune_daily(&cutoff);
        if pruned > 0 {
            log::info!("[TASK] Pruned {} days of daily counts", pruned);
        }

        if !is_cycle_day {
            return CycleOutcome::Skipped;
        }

        match document.scores.winner() {
            Some(winner) => {
                let standings = document.scores.leaderboard(LEADERBOARD_SIZE);
                document.scores.reset_weekly(now);
                CycleOutcome::Awarded { winner, standings }
            }
            None => CycleOutcome::Empty,
        }
    });

    // A failed snapshot keeps the week running, the winner is not announced.
    let outcome = match saved {
        Ok(outcome) => outcome,
        Err(err) => {
            log::error!("[STORE] Failed to save state after cycle: {}", err);
            return Err(err);
        }
    };

    let (winner, standings) = match outcome {
        CycleOutcome::Awarded { winner, standings } => (winner, standings),
        CycleOutcome::Empty => {
            log::info!("[TASK] Nobody scored this week, keeping the title");
            return Ok(CycleOutcome::Empty);
        }
        CycleOutcome::Skipped => return Ok(CycleOutcome::Skipped),
    };

    log::info!(
        "[TASK] Member {} won the week with {} points",
        winner.0,
        winner.1
    );

    if cycle.guild_id != 0 && cycle.role_id != 0 {
        transfer_role(chat, cycle.guild_id, cycle.role_id, winner.0).await;
    }

    let content = format::cycle_winner(winner, &standings);
    broadcast(chat, &announce.channels, announce.mode, &content).await;

    Ok(CycleOutcome::Awarded { winner, standings })
}

/// Makes `winner` the only holder of the role. Failures are logged and the
/// remaining steps still run.
async fn transfer_role<C>(chat: &C, guild_id: u64, role_id: u64, winner: MemberId)
where
    C: ChatApi,
{
    let holders = match chat.role_members(guild_id, role_id).await {
        Ok(holders) => holders,
        Err(err) => {
            log::error!("[TASK] Failed to fetch holders of role {}: {}", role_id, err);
            Vec::new()
        }
    };

    for holder in holders.iter().copied().filter(|h| *h != winner) {
        if let Err(err) = chat.remove_member_role(guild_id, holder, role_id).await {
            log::error!("[TASK] Failed to remove role from {}: {}", holder, err);
        }
    }

    if !holders.contains(&winner) {
        if let Err(err) = chat.add_member_role(guild_id, winner, role_id).await {
            log::error!("[TASK] Failed to give role to {}: {}", winner, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archi::{AlertKind, Capturer, PointPolicy};
    use crate::config::BroadcastMode;
    use crate::core::chat::mock::MockChat;

    use chrono::Weekday;

    const GUILD: u64 = 10;
    const ROLE: u64 = 20;
    const CHANNEL: u64 = 30;
    const U1: MemberId = 111;
    const U2: MemberId = 222;

    fn store() -> Store {
        let store = Store::in_memory();
        store.configure(PointPolicy { common: 1, rare: 5 }, ["bulgig"]);
        store
    }

    fn announce() -> Announce {
        Announce {
            channels: vec![CHANNEL],
            mode: BroadcastMode::First,
        }
    }

    fn cycle() -> Cycle {
        Cycle {
            weekdays: vec![Weekday::Sun],
            guild_id: GUILD,
            role_id: ROLE,
            ..Default::default()
        }
    }

    fn time(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[tokio::test]
    async fn test_sweep_alerts_once() {
        let store = store();
        let chat = MockChat::new();
        let capture = time("2024-01-01T10:00:00+01:00");

        store
            .write(|d| d.archis.register_capture("Bulgig", Capturer::External, capture))
            .unwrap();

        let report = run_sweep(&store, capture + Duration::hours(9), &chat, &announce())
            .await
            .unwrap();
        assert!(report.is_empty());
        assert!(chat.sent().is_empty());

        let report = run_sweep(&store, capture + Duration::hours(11), &chat, &announce())
            .await
            .unwrap();
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].kind, AlertKind::Rare);

        let sent = chat.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, CHANNEL);
        assert!(sent[0].1.contains("Bulgig"));

        let report = run_sweep(&store, capture + Duration::hours(12), &chat, &announce())
            .await
            .unwrap();
        assert!(report.is_empty());
        assert_eq!(chat.sent().len(), 1);

        let report = run_sweep(&store, capture + Duration::hours(15), &chat, &announce())
            .await
            .unwrap();
        assert_eq!(report.expired.len(), 1);
        assert!(store.read(|d| d.archis.is_empty()));
    }

    #[tokio::test]
    async fn test_cycle_awards_winner() {
        let store = store();
        let chat = MockChat::new();
        chat.give_role(GUILD, U1, ROLE);

        store
            .write(|d| {
                d.scores.weekly.insert(U1, 5);
                d.scores.weekly.insert(U2, 7);
            })
            .unwrap();

        // 2024-01-07 is a Sunday.
        let now = time("2024-01-07T21:00:00+01:00");
        let outcome = run_cycle(&store, now, &chat, &cycle(), &announce())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CycleOutcome::Awarded {
                winner: (U2, 7),
                standings: vec![(U2, 7), (U1, 5)],
            }
        );
        assert!(store.read(|d| d.scores.weekly.is_empty()));

        assert_eq!(chat.role_members(GUILD, ROLE).await.unwrap(), vec![U2]);

        let sent = chat.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("<@222> remporte le titre avec 7 points"));
    }

    #[tokio::test]
    async fn test_cycle_skips_other_days() {
        let store = store();
        let chat = MockChat::new();

        store
            .write(|d| {
                d.scores.weekly.insert(U1, 5);
                d.scores
                    .daily
                    .insert(String::from("2023-11-01"), [(U1, 5)].into_iter().collect());
                d.scores
                    .daily
                    .insert(String::from("2024-01-05"), [(U1, 5)].into_iter().collect());
            })
            .unwrap();

        // Saturday.
        let now = time("2024-01-06T21:00:00+01:00");
        let outcome = run_cycle(&store, now, &chat, &cycle(), &announce())
            .await
            .unwrap();

        assert_eq!(outcome, CycleOutcome::Skipped);
        assert_eq!(store.read(|d| d.scores.weekly.get(&U1).copied()), Some(5));
        assert!(chat.sent().is_empty());

        // Days outside of the retention period are dropped on every run.
        let days: Vec<String> = store.read(|d| d.scores.daily.keys().cloned().collect());
        assert_eq!(days, vec![String::from("2024-01-05")]);
    }

    #[tokio::test]
    async fn test_cycle_empty_ledger() {
        let store = store();
        let chat = MockChat::new();
        chat.give_role(GUILD, U1, ROLE);

        let now = time("2024-01-07T21:00:00+01:00");
        let outcome = run_cycle(&store, now, &chat, &cycle(), &announce())
            .await
            .unwrap();

        assert_eq!(outcome, CycleOutcome::Empty);
        assert!(chat.sent().is_empty());
        assert_eq!(chat.role_members(GUILD, ROLE).await.unwrap(), vec![U1]);
    }

    #[tokio::test]
    async fn test_cycle_every_day_without_role() {
        let store = store();
        let chat = MockChat::new();

        store.write(|d| d.scores.weekly.insert(U1, 1)).unwrap();

        let cycle = Cycle {
            weekdays: Vec::new(),
            ..Default::default()
        };

        let now = time("2024-01-03T21:00:00+01:00");
        let outcome = run_cycle(&store, now, &chat, &cycle, &announce())
            .await
            .unwrap();

        assert!(matches!(outcome, CycleOutcome::Awarded { .. }));
        assert!(chat.roles.lock().is_empty());
        assert_eq!(chat.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_save_posts_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archis.json");
        let capture = time("2024-01-07T10:00:00+01:00");

        let store = Store::open(&path).unwrap();
        store.configure(PointPolicy { common: 1, rare: 5 }, ["bulgig"]);
        store
            .write(|d| {
                d.archis
                    .register_capture("Bulgig", Capturer::member(U1, "Robin"), capture);
                d.scores.award(U1, "2024-01-07", true);
            })
            .unwrap();

        // A directory in place of the state file makes every snapshot fail.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let chat = MockChat::new();
        let now = time("2024-01-07T21:00:00+01:00");

        assert!(run_sweep(&store, now, &chat, &announce()).await.is_err());
        assert!(run_cycle(&store, now, &chat, &cycle(), &announce()).await.is_err());

        assert!(chat.sent().is_empty());
        assert!(chat.roles.lock().is_empty());
        assert_eq!(store.read(|d| d.scores.weekly.get(&U1).copied()), Some(5));
        assert_eq!(store.read(|d| d.scores.week_start), None);
    }
}
