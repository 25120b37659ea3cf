//! UI context lifecycle: phase plus the finishing flag.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Ordered like a platform lifecycle: `Destroyed` is terminal and lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Destroyed,
    Created,
    Started,
    Resumed,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Destroyed => "destroyed",
            Self::Created => "created",
            Self::Started => "started",
            Self::Resumed => "resumed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Lifecycle {
    phase: Arc<watch::Sender<Phase>>,
    finishing: Arc<AtomicBool>,
    restarting: Arc<AtomicBool>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Phase::Created);
        Self {
            phase: Arc::new(tx),
            finishing: Arc::new(AtomicBool::new(false)),
            restarting: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    pub fn is_at_least(&self, phase: Phase) -> bool {
        self.phase() >= phase
    }

    /// Foreground: navigation commands are consumed only here.
    pub fn is_resumed(&self) -> bool {
        self.is_at_least(Phase::Resumed)
    }

    /// Created and not yet destroyed.
    pub fn is_active(&self) -> bool {
        self.is_at_least(Phase::Created)
    }

    pub fn resume(&self) {
        self.move_to(Phase::Resumed);
    }

    pub fn pause(&self) {
        self.move_to(Phase::Started);
    }

    pub fn destroy(&self) {
        self.move_to(Phase::Destroyed);
    }

    /// Mark the context as closing. Returns `true` for the first call only.
    pub fn finish(&self) -> bool {
        !self.finishing.swap(true, Ordering::AcqRel)
    }

    pub fn is_finishing(&self) -> bool {
        self.finishing.load(Ordering::Acquire)
    }

    /// Finish and ask the shell for a fresh context. Has no effect on a
    /// context that is already finishing.
    pub fn restart(&self) -> bool {
        let first = self.finish();
        if first {
            self.restarting.store(true, Ordering::Release);
        }
        first
    }

    pub fn is_restarting(&self) -> bool {
        self.restarting.load(Ordering::Acquire)
    }

    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    fn move_to(&self, next: Phase) {
        self.phase.send_if_modified(|current| {
            if *current == Phase::Destroyed || *current == next {
                return false;
            }
            tracing::debug!(from = %current, to = %next, "lifecycle transition");
            *current = next;
            true
        });
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
