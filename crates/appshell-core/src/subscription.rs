//! Revocable listener registrations.
//!
//! A [`Subscription`] is a shared flag: cancelling it (any number of times,
//! from any clone) stops the listener from being invoked again. [`Listeners`]
//! prunes cancelled entries lazily on dispatch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone)]
pub struct Subscription {
    active: Arc<AtomicBool>,
}

impl Subscription {
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Revoke the registration. Returns `true` only for the call that
    /// actually deactivated it.
    pub fn cancel(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of listeners of type `L` (usually a `dyn FnMut(..)`).
pub struct Listeners<L: ?Sized> {
    entries: Vec<(Subscription, Box<L>)>,
}

impl<L: ?Sized> Listeners<L> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn register(&mut self, listener: Box<L>) -> Subscription {
        self.register_with(|_| listener)
    }

    /// Register a listener that needs its own handle, e.g. to unregister
    /// itself once a terminal condition is reached.
    pub fn register_with(&mut self, make: impl FnOnce(Subscription) -> Box<L>) -> Subscription {
        let subscription = Subscription::new();
        let listener = make(subscription.clone());
        self.entries.push((subscription.clone(), listener));
        subscription
    }

    /// Invoke `f` on every active listener in registration order.
    ///
    /// A listener cancelled during dispatch is skipped for the rest of the
    /// pass and dropped afterwards.
    pub fn for_each_active(&mut self, mut f: impl FnMut(&mut L)) {
        for (subscription, listener) in &mut self.entries {
            if subscription.is_active() {
                f(&mut **listener);
            }
        }
        self.entries.retain(|(subscription, _)| subscription.is_active());
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|(s, _)| s.is_active()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        for (subscription, _) in self.entries.drain(..) {
            subscription.cancel();
        }
    }
}

impl<L: ?Sized> Default for Listeners<L> {
    fn default() -> Self {
        Self::new()
    }
}
