use crate::bot::TaskContext;
use crate::core::executor::Executor;

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use tokio::sync::mpsc;
use tokio::{select, task, time};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const SCHEDULER_MESSAGEQUEUE_SIZE: usize = 32;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaskSchedule {
    /// Repeats the task after a specific interval.
    Interval(Duration),
    /// Runs the task once a day at a wall-clock time of `tz`.
    DailyAt { hour: u32, minute: u32, tz: Tz },
}

impl TaskSchedule {
    /// Creates a new `TaskSchedule` that runs the task once every hour.
    pub fn hourly() -> Self {
        Self::Interval(Duration::hours(1))
    }

    pub fn daily_at(hour: u32, minute: u32, tz: Tz) -> Self {
        Self::DailyAt { hour, minute, tz }
    }

    /// Returns the next execution time after `now`. Returns `None` if the
    /// task never runs again.
    pub fn advance(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Interval(duration) => Some(now + *duration),
            Self::DailyAt { hour, minute, tz } => {
                let today = now.with_timezone(tz).naive_local().date();

                // A wall-clock time skipped by a DST change does not exist on
                // that day, the next day is used instead.
                for days in 0..3 {
                    let naive = (today + Duration::days(days)).and_hms_opt(*hour, *minute, 0)?;

                    if let Some(datetime) = tz.from_local_datetime(&naive).earliest() {
                        let datetime = datetime.with_timezone(&Utc);
                        if datetime > now {
                            return Some(datetime);
                        }
                    }
                }

                None
            }
        }
    }
}

/// A `Task` is an automatically repeated job. A Task's schedule is defined
/// using [`TaskSchedule`].
#[derive(Clone, Debug)]
pub struct Task<C = TaskContext> {
    pub name: String,
    pub schedule: TaskSchedule,
    pub executor: Executor<C>,
    /// Makes the task execute immediately when it is added.
    pub on_load: bool,
}

#[derive(Clone, Debug)]
struct LoadedTask<C> {
    name: String,
    schedule: TaskSchedule,
    executor: Executor<C>,
    /// The time the task should be called again. Used to order the task queue.
    next_execution_time: DateTime<Utc>,
    running: Arc<AtomicBool>,
}

impl<C> LoadedTask<C> {
    /// Converts a [`Task`] into a `LoadedTask` using `now` as the current time.
    /// Returns `None` if a task will never execute.
    fn from(task: Task<C>, now: DateTime<Utc>) -> Option<Self> {
        let next_execution_time = match task.on_load {
            true => now,
            false => task.schedule.advance(now)?,
        };

        Some(Self {
            name: task.name,
            schedule: task.schedule,
            executor: task.executor,
            next_execution_time,
            running: Arc::new(AtomicBool::new(false)),
        })
    }
}

/// Marks a task as running for as long as it lives.
#[derive(Debug)]
struct RunGuard(Arc<AtomicBool>);

impl RunGuard {
    /// Returns `None` if the task is still running.
    fn acquire(running: &Arc<AtomicBool>) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;

        Some(Self(running.clone()))
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Tasks ordered by their next execution time.
#[derive(Debug)]
struct TaskQueue<T> {
    tasks: VecDeque<(DateTime<Utc>, T)>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }
}

impl<T> TaskQueue<T> {
    /// Pushes a new task into the queue. Tasks with the same execution time
    /// keep their insertion order.
    fn push(&mut self, time: DateTime<Utc>, task: T) {
        let index = self
            .tasks
            .iter()
            .position(|(t, _)| time < *t)
            .unwrap_or(self.tasks.len());

        self.tasks.insert(index, (time, task));
    }

    /// Returns the next task to be executed.
    fn pop(&mut self) -> Option<(DateTime<Utc>, T)> {
        self.tasks.pop_front()
    }

    fn next_time(&self) -> Option<DateTime<Utc>> {
        self.tasks.front().map(|(t, _)| *t)
    }

    fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

struct InnerTaskScheduler<C> {
    tasks: TaskQueue<LoadedTask<C>>,
    context: Option<C>,
}

impl<C> Default for InnerTaskScheduler<C> {
    fn default() -> Self {
        Self {
            tasks: TaskQueue::default(),
            context: None,
        }
    }
}

impl<C> InnerTaskScheduler<C>
where
    C: Clone + Send + Sync + 'static,
{
    fn add_task(&mut self, task: Task<C>) {
        log::info!("[TASK] Added new task '{}'", task.name);

        // Only add the task if it ever executes.
        if let Some(task) = LoadedTask::from(task, Utc::now()) {
            self.tasks.push(task.next_execution_time, task);
        }
    }

    /// Waits until the next task reaches its execution time. If the Future
    /// is dropped early, the queue is left untouched.
    async fn await_next(&self) {
        if let Some(time) = self.tasks.next_time() {
            if let Ok(wait) = (time - Utc::now()).to_std() {
                time::sleep(wait).await;
            }
        }
    }

    fn run_next(&mut self) {
        let (_, mut task) = match self.tasks.pop() {
            Some(task) => task,
            None => return,
        };

        match (RunGuard::acquire(&task.running), self.context.clone()) {
            (Some(guard), Some(ctx)) => {
                let name = task.name.clone();
                let executor = task.executor.clone();

                task::spawn(async move {
                    log::debug!("[TASK] Running task '{}'", name);

                    match executor.send(ctx).await {
                        Ok(()) => log::debug!("[TASK] Task '{}' completed", name),
                        Err(err) => log::error!("[TASK] Task '{}' failed: {}", name, err),
                    }

                    drop(guard);
                });
            }
            (None, _) => {
                log::warn!(
                    "[TASK] Skipping task '{}', previous run did not finish",
                    task.name
                );
            }
            (_, None) => {}
        }

        // Put the task back into the queue. If `advance` returns `None` the
        // task never executes again.
        if let Some(next_execution_time) = task.schedule.advance(Utc::now()) {
            task.next_execution_time = next_execution_time;
            self.tasks.push(next_execution_time, task);
        }
    }

    fn handle_message(&mut self, message: TaskSchedulerMessage<C>) {
        match message {
            TaskSchedulerMessage::AddTask(task) => self.add_task(task),
            TaskSchedulerMessage::UpdateContext(ctx) => self.context = ctx,
        }
    }

    fn start(mut self) -> mpsc::Sender<TaskSchedulerMessage<C>> {
        let (tx, mut rx) = mpsc::channel(SCHEDULER_MESSAGEQUEUE_SIZE);

        task::spawn(async move {
            loop {
                // While no tasks are queued or no context is given no
                // tasks can be executed.
                if self.tasks.is_empty() || self.context.is_none() {
                    match rx.recv().await {
                        Some(msg) => self.handle_message(msg),
                        None => return,
                    }
                    continue;
                }

                select! {
                    _ = self.await_next() => self.run_next(),
                    msg = rx.recv() => match msg {
                        Some(msg) => self.handle_message(msg),
                        None => return,
                    },
                }
            }
        });

        tx
    }
}

enum TaskSchedulerMessage<C> {
    AddTask(Task<C>),
    UpdateContext(Option<C>),
}

#[derive(Clone, Debug)]
pub struct TaskScheduler {
    tx: mpsc::Sender<TaskSchedulerMessage<TaskContext>>,
}

impl TaskScheduler {
    /// Creates a new `TaskScheduler` with a new internal task queue.
    pub fn new() -> Self {
        let inner = InnerTaskScheduler::default();

        Self { tx: inner.start() }
    }

    /// Add a new task to the task queue.
    pub async fn add_task(&self, task: Task) {
        let _ = self.tx.send(TaskSchedulerMessage::AddTask(task)).await;
    }

    /// Updates the `Context` for the task executor. If the context was
    /// previously `None` and is set to a non-`None` value, the executor starts
    /// executing tasks.
    pub async fn update_context(&self, ctx: Option<TaskContext>) {
        let _ = self.tx.send(TaskSchedulerMessage::UpdateContext(ctx)).await;
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}
