//! Process-wide owner of background work that must outlive a UI context.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

/// Tracks fire-and-forget tasks so they are never cancelled by a UI
/// teardown and can still be awaited deterministically.
#[derive(Debug, Clone)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        let tracker = TaskTracker::new();
        // Kept closed so `wait` resolves whenever nothing is in flight;
        // closing does not stop new spawns.
        tracker.close();
        Self { tracker }
    }

    pub fn spawn<F>(&self, name: &'static str, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        tracing::debug!(task = name, "background task spawned");
        self.tracker.spawn(future)
    }

    /// Run blocking work on the blocking pool under supervision.
    pub fn spawn_blocking<F, R>(&self, name: &'static str, work: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        tracing::debug!(task = name, "background blocking task spawned");
        self.tracker.spawn_blocking(work)
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until no supervised task is running.
    pub async fn wait_idle(&self) {
        self.tracker.wait().await;
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}
