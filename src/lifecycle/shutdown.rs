//! Shutdown coordination for the proxy.

use std::time::Duration;

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Long-running tasks subscribe for a [`ShutdownSignal`]; triggering (or
/// dropping) the coordinator releases every subscriber.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    drain_timeout: Duration,
}

impl Shutdown {
    /// `drain_timeout` bounds how long in-flight requests may keep running
    /// after the trigger.
    pub fn new(drain_timeout: Duration) -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx, drain_timeout }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
            drain_timeout: self.drain_timeout,
        }
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    pub fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }
}

/// Receiving side of [`Shutdown`].
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: broadcast::Receiver<()>,
    drain_timeout: Duration,
}

impl ShutdownSignal {
    /// Resolve once shutdown is triggered or the coordinator is gone.
    pub async fn recv(mut self) {
        let _ = self.rx.recv().await;
    }

    pub fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }
}
