//! Background drain workers and component lifecycle.
//!
//! Each protocol role owns one [`Workers`] set. A drain worker owns the
//! receiving end of an outbound queue and runs until the set is closed,
//! the queue's senders are gone, or the owning component is dropped.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

/// Lock a mutex, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct Workers {
    name: &'static str,
    shutdown: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl Workers {
    pub(crate) fn new(name: &'static str) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            name,
            shutdown,
            handles: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Spawn a worker feeding every item of `rx` to `f`, one at a time.
    ///
    /// An item being processed when shutdown is signalled is finished;
    /// items still queued are dropped.
    pub(crate) fn spawn_drain<T, F, Fut>(&self, mut rx: mpsc::Receiver<T>, mut f: F)
    where
        T: Send + 'static,
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.is_closed() {
            return;
        }

        let name = self.name;
        let mut shutdown = self.shutdown.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                if *shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    item = rx.recv() => match item {
                        Some(item) => f(item).await,
                        None => break,
                    },
                }
            }

            rx.close();
            let mut dropped = 0usize;
            while rx.try_recv().is_ok() {
                dropped += 1;
            }
            debug!(worker = name, dropped, "drain worker stopped");
        });
        lock(&self.handles).push(handle);
    }

    /// Signal every worker to stop. Returns `false` if already closed.
    ///
    /// Does not wait for the workers; see [`Workers::join`].
    pub(crate) fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.shutdown.send_replace(true);
        true
    }

    /// Resolves once the set has been closed.
    pub(crate) async fn closed(&self) {
        let mut shutdown = self.shutdown.subscribe();
        // The sender lives as long as `self`, so this only ends on close.
        let _ = shutdown.wait_for(|closed| *closed).await;
    }

    /// Wait for every spawned worker to finish.
    pub(crate) async fn join(&self) {
        let handles: Vec<_> = lock(&self.handles).drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                debug!(worker = self.name, error = %e, "drain worker did not finish cleanly");
            }
        }
    }
}
