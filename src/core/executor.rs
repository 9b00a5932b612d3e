use crate::bot::{self, Error};

use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use tokio::{
    sync::{mpsc, oneshot},
    task,
};

/// Size of the queue of pending calls per executor.
const EXECUTOR_QUEUE_SIZE: usize = 32;

/// A handle to an async function running on its own task. Every call is
/// spawned separately, a slow call never blocks the next one.
pub struct Executor<T> {
    tx: mpsc::Sender<(T, oneshot::Sender<bot::Result>)>,
}

impl<T> Executor<T> {
    /// Runs the function with `ctx` and waits for its result.
    pub async fn send(&self, ctx: T) -> bot::Result {
        let (tx, rx) = oneshot::channel();

        if self.tx.send((ctx, tx)).await.is_err() {
            return Err(Error::NoResponse);
        }

        match rx.await {
            Ok(val) => val,
            // Sender was dropped. If this happens the
            // task likely panicked.
            Err(_) => Err(Error::NoResponse),
        }
    }
}

impl<T> Executor<T>
where
    T: Send + 'static,
{
    pub fn from_fn<F>(f: fn(T) -> F) -> Self
    where
        F: Future<Output = bot::Result> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<(T, oneshot::Sender<bot::Result>)>(EXECUTOR_QUEUE_SIZE);

        task::spawn(async move {
            while let Some((data, tx)) = rx.recv().await {
                task::spawn(async move {
                    let res = f(data).await;
                    let _ = tx.send(res);
                });
            }
        });

        Self { tx }
    }
}

impl<T> Clone for Executor<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> Debug for Executor<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("Executor")
    }
}
