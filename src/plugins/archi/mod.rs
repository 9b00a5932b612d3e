//! # Archi
//! Tracks the repop windows of captured archimonsters, alerts when a window
//! opens and keeps the capture leaderboard. Every week the best hunter
//! receives the title role.
pub mod actions;
pub mod broadcast;
mod commands;
pub mod format;
pub mod tasks;

use crate::bot::Result;
use crate::core::{state::State, task::TaskSchedule};
use crate::task;

/// Number of members shown in leaderboards.
pub const LEADERBOARD_SIZE: usize = 10;

pub async fn init(state: &State) -> Result {
    for f in commands::COMMANDS {
        state.commands().load_command(f())?;
    }

    state.tasks().add_task(sweep(state)).await;
    state.tasks().add_task(cycle(state)).await;

    Ok(())
}

// Runs right after connecting to catch windows opened while offline.
task!(sweep, |_| TaskSchedule::hourly(), tasks::sweep, on_load: true);

task!(
    cycle,
    |state| TaskSchedule::daily_at(state.config.cycle.hour, state.config.cycle.minute, state.tz()),
    tasks::cycle,
);
