//! Splash gate: holds back the first frame until startup has finished.
//!
//! The rendering path calls [`PreDrawObservers::dispatch_on_pre_draw`] before
//! every frame. The gate's observer suspends frames until its
//! [`ReadinessFlag`] is set, then lets the frame through and unregisters
//! itself. There is no timeout here: a gate that is never released keeps the
//! splash on screen.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::subscription::{Listeners, Subscription};

/// Pre-draw hook. Returning `false` suspends the frame.
pub type PreDrawListener = dyn FnMut() -> bool + Send;

#[derive(Default)]
pub struct PreDrawObservers {
    listeners: Listeners<PreDrawListener>,
}

impl PreDrawObservers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Box<PreDrawListener>) -> Subscription {
        self.listeners.register(listener)
    }

    pub fn add_with(
        &mut self,
        make: impl FnOnce(Subscription) -> Box<PreDrawListener>,
    ) -> Subscription {
        self.listeners.register_with(make)
    }

    /// Run every observer before a frame. The frame proceeds only if all of
    /// them agree.
    pub fn dispatch_on_pre_draw(&mut self) -> bool {
        let mut proceed = true;
        self.listeners.for_each_active(|listener| {
            proceed &= listener();
        });
        proceed
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// Monotonic false→true flag shared between the startup path and the
/// pre-draw observer.
#[derive(Debug, Clone, Default)]
pub struct ReadinessFlag(Arc<AtomicBool>);

impl ReadinessFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Set the flag. Returns `true` only for the call that flipped it.
    pub fn mark_ready(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }
}

pub struct SplashGate {
    flag: ReadinessFlag,
    observer: Subscription,
}

impl SplashGate {
    /// Register the gate's pre-draw observer.
    pub fn install(observers: &mut PreDrawObservers) -> Self {
        let flag = ReadinessFlag::new();
        let watched = flag.clone();
        let observer = observers.add_with(move |own| {
            Box::new(move || {
                if watched.is_ready() {
                    own.cancel();
                    true
                } else {
                    false
                }
            })
        });
        Self { flag, observer }
    }

    pub fn is_ready(&self) -> bool {
        self.flag.is_ready()
    }

    pub fn mark_ready(&self) -> bool {
        self.flag.mark_ready()
    }

    pub fn flag(&self) -> ReadinessFlag {
        self.flag.clone()
    }

    /// Whether the pre-draw observer is still registered.
    pub fn is_installed(&self) -> bool {
        self.observer.is_active()
    }

    /// Drop the observer without releasing the flag (context teardown).
    pub fn uninstall(&self) {
        self.observer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_suspended_until_ready() {
        let mut observers = PreDrawObservers::new();
        let gate = SplashGate::install(&mut observers);

        for _ in 0..5 {
            assert!(!gate.is_ready());
            assert!(!observers.dispatch_on_pre_draw());
        }

        assert!(gate.mark_ready());
        assert!(observers.dispatch_on_pre_draw());
        assert!(gate.is_ready());
    }

    #[test]
    fn observer_removed_after_release() {
        let mut observers = PreDrawObservers::new();
        let gate = SplashGate::install(&mut observers);
        assert_eq!(observers.len(), 1);

        gate.mark_ready();
        assert!(observers.dispatch_on_pre_draw());
        assert!(!gate.is_installed());
        assert!(observers.is_empty());

        // Later frames no longer consult the gate.
        for _ in 0..3 {
            assert!(observers.dispatch_on_pre_draw());
        }
    }

    #[test]
    fn flag_flips_exactly_once() {
        let flag = ReadinessFlag::new();
        assert!(!flag.is_ready());
        assert!(flag.mark_ready());
        assert!(!flag.mark_ready());
        assert!(flag.is_ready());
    }

    #[test]
    fn flag_visible_across_threads() {
        let flag = ReadinessFlag::new();
        let writer = flag.clone();
        std::thread::spawn(move || {
            writer.mark_ready();
        })
        .join()
        .expect("writer thread");
        assert!(flag.is_ready());
    }

    #[test]
    fn any_suspending_observer_blocks_frame() {
        let mut observers = PreDrawObservers::new();
        let gate = SplashGate::install(&mut observers);
        let _other = observers.add(Box::new(|| false));

        gate.mark_ready();
        assert!(!observers.dispatch_on_pre_draw());
        // The gate still released and removed itself.
        assert!(!gate.is_installed());
    }

    #[test]
    fn uninstall_leaves_flag_unset() {
        let mut observers = PreDrawObservers::new();
        let gate = SplashGate::install(&mut observers);
        gate.uninstall();
        assert!(observers.dispatch_on_pre_draw());
        assert!(!gate.is_ready());
    }
}
