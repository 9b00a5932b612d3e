use futures::future::BoxFuture;
use tokio::sync::watch;

use std::future::Future;
use std::pin::Pin;
use std::sync::OnceLock;
use std::task::{Context, Poll};

static SHUTDOWN: OnceLock<Shutdown> = OnceLock::new();

fn shutdown() -> &'static Shutdown {
    SHUTDOWN.get_or_init(Shutdown::new)
}

/// Subscribe to the shutdown signal. Returns a [`ShutdownListener`] whose
/// Future completes once a shutdown signal is received.
pub fn subscribe<'a>() -> ShutdownListener<'a> {
    shutdown().subscribe()
}

/// Sends a signal to terminate to all [`ShutdownListener`]s. A `terminate()`
/// call cannot be undone.
pub fn terminate() {
    shutdown().terminate();
}

/// A one-way termination flag shared by any number of listeners.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe<'a>(&self) -> ShutdownListener<'a> {
        ShutdownListener::new(self.tx.subscribe())
    }

    pub fn terminate(&self) {
        // `send` fails while nobody is subscribed, the value must still be
        // stored for later listeners.
        self.tx.send_replace(true);
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// A listener for shutdown signals. When a shutdown signal is received, the
/// `ShutdownListener` future completes.
pub struct ShutdownListener<'a> {
    rx: watch::Receiver<bool>,
    fut: Option<BoxFuture<'a, ()>>,
}

impl<'a> ShutdownListener<'a> {
    fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx, fut: None }
    }
}

impl<'a> Future for ShutdownListener<'a> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, ctx: &mut Context) -> Poll<Self::Output> {
        let this = self.get_mut();

        if this.fut.is_none() {
            let mut rx = this.rx.clone();
            this.fut = Some(Box::pin(async move {
                loop {
                    // A signal sent before subscribing is already visible.
                    let terminated = *rx.borrow();
                    if terminated || rx.changed().await.is_err() {
                        return;
                    }
                }
            }));
        }

        match &mut this.fut {
            Some(fut) => fut.as_mut().poll(ctx),
            None => Poll::Ready(()),
        }
    }
}

/// Registers all signal handlers. Before `init` is called, no signals are
/// intercepted. The exact behavior depends on the os family.
pub fn init() {
    #[cfg(target_family = "unix")]
    unix::init();

    #[cfg(not(target_family = "unix"))]
    tokio::task::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            terminate();
        }
    });
}

#[cfg(target_family = "unix")]
mod unix {
    use super::terminate;
    use tokio::signal::unix::{signal, SignalKind};

    /// Listens for the following signals:
    /// - SIGINT
    /// - SIGTERM
    pub(super) fn init() {
        for kind in [SignalKind::interrupt(), SignalKind::terminate()] {
            let mut stream = match signal(kind) {
                Ok(stream) => stream,
                Err(err) => {
                    log::error!("[CORE] Failed to install signal handler: {}", err);
                    continue;
                }
            };

            tokio::task::spawn(async move {
                if stream.recv().await.is_some() {
                    log::info!("[CORE] Received shutdown signal");
                    terminate();
                }
            });
        }
    }
}
