/// Defines a function `$name` returning the [`Command`] of the same name.
///
/// ```ignore
/// command!(timer, description: "...", usage: "<Archimonstre>", executor: _timer);
/// ```
///
/// [`Command`]: crate::core::command::Command
#[macro_export]
macro_rules! command {
    ($name:ident
        $(, description: $description:expr)?
        $(, usage: $usage:expr)?
        $(, example: $example:expr)?
        $(, restricted: $restricted:expr)?
        $(, executor: $executor:expr)?
        $(,)?
    ) => {
        fn $name() -> $crate::core::command::Command {
            let mut cmd = $crate::core::command::Command::new(stringify!($name));

            $(
                cmd.description = $description.to_string();
            )?

            $(
                cmd.usage = $usage.to_string();
            )?

            $(
                cmd.example = $example.to_string();
            )?

            $(
                cmd.restricted = $restricted;
            )?

            $(
                let executor = $crate::core::executor::Executor::from_fn($executor);
                cmd.executor = ::std::option::Option::Some(executor);
            )?

            cmd
        }
    };
}

/// Defines a function `$name` returning the [`Task`] of the same name. The
/// schedule is built from the state, tasks run at configured times.
///
/// [`Task`]: crate::core::task::Task
#[macro_export]
macro_rules! task {
    ($name:ident, $schedule:expr, $executor:expr $(, on_load: $on_load:expr)? $(,)?) => {
        fn $name(state: &$crate::core::state::State) -> $crate::core::task::Task {
            let on_load = false $(|| $on_load)?;

            let schedule: fn(&$crate::core::state::State) -> $crate::core::task::TaskSchedule =
                $schedule;

            $crate::core::task::Task {
                name: stringify!($name).to_owned(),
                schedule: schedule(state),
                executor: $crate::core::executor::Executor::from_fn($executor),
                on_load,
            }
        }
    };
}
