use crate::config::Config;
use crate::core::{command::CommandHandler, store::Store, task::TaskScheduler};

use chrono::{DateTime, FixedOffset, Offset, Utc};
use chrono_tz::Tz;

/// The global shared state. Handlers receive it through their context.
#[derive(Debug)]
pub struct State {
    pub config: Config,
    tz: Tz,
    commands: CommandHandler,
    tasks: TaskScheduler,
    store: Store,
}

impl State {
    pub fn new(config: Config, tz: Tz, store: Store) -> Self {
        Self {
            config,
            tz,
            commands: CommandHandler::new(),
            tasks: TaskScheduler::new(),
            store,
        }
    }

    /// Returns a reference to the internal [`CommandHandler`].
    pub fn commands(&self) -> &CommandHandler {
        &self.commands
    }

    /// Returns a reference to the internal [`TaskScheduler`].
    pub fn tasks(&self) -> &TaskScheduler {
        &self.tasks
    }

    /// Returns a reference to the internal [`Store`].
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Returns the current time in the configured time zone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        local_time(Utc::now(), self.tz)
    }
}

/// Converts `datetime` into `tz`, keeping only the offset in effect at that
/// instant.
pub fn local_time(datetime: DateTime<Utc>, tz: Tz) -> DateTime<FixedOffset> {
    let local = datetime.with_timezone(&tz);
    local.with_timezone(&local.offset().fix())
}
