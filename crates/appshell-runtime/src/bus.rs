//! Single-consumer event buses shared by every producer.
//!
//! A bus is a process-wide service handed out as `Arc<EventBus<T>>`. Any
//! number of producers publish; at most one consumer is attached at a time.
//! Items published while nobody is attached, or still queued when the
//! consumer detaches, are discarded and counted.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// No consumer was attached.
    Dropped,
}

pub struct EventBus<T> {
    name: &'static str,
    tx: mpsc::UnboundedSender<T>,
    /// Parked receiver while no consumer is attached.
    rx: Mutex<Option<mpsc::UnboundedReceiver<T>>>,
    attached: AtomicBool,
    discarded: AtomicU64,
}

impl<T> EventBus<T> {
    pub fn new(name: &'static str) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            name,
            tx,
            rx: Mutex::new(Some(rx)),
            attached: AtomicBool::new(false),
            discarded: AtomicU64::new(0),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn publish(&self, item: T) -> Delivery {
        if !self.attached.load(Ordering::Acquire) {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(bus = self.name, "no consumer attached, item dropped");
            return Delivery::Dropped;
        }
        match self.tx.send(item) {
            Ok(()) => Delivery::Queued,
            Err(_) => {
                self.discarded.fetch_add(1, Ordering::Relaxed);
                Delivery::Dropped
            }
        }
    }

    /// Attach the single consumer. Returns `None` while another consumer
    /// holds the bus.
    pub fn attach(self: &Arc<Self>) -> Option<BusConsumer<T>> {
        let mut rx = self.rx.lock().ok()?.take()?;

        // Items that raced a previous detach belong to no one.
        let stale = drain(&mut rx);
        if stale > 0 {
            self.discarded.fetch_add(stale, Ordering::Relaxed);
            tracing::warn!(bus = self.name, stale, "discarded items queued before attach");
        }

        self.attached.store(true, Ordering::Release);
        tracing::debug!(bus = self.name, "consumer attached");
        Some(BusConsumer {
            bus: Arc::clone(self),
            rx: Some(rx),
        })
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Total items dropped or discarded since the bus was created.
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}

/// The attached consumer. Dropping it detaches from the bus.
pub struct BusConsumer<T> {
    bus: Arc<EventBus<T>>,
    rx: Option<mpsc::UnboundedReceiver<T>>,
}

impl<T> BusConsumer<T> {
    /// Wait for the next item. Cancel-safe.
    pub async fn recv(&mut self) -> Option<T> {
        match self.rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.as_mut()?.try_recv().ok()
    }
}

impl<T> Drop for BusConsumer<T> {
    fn drop(&mut self) {
        self.bus.attached.store(false, Ordering::Release);
        let Some(mut rx) = self.rx.take() else {
            return;
        };

        let pending = drain(&mut rx);
        if pending > 0 {
            self.bus.discarded.fetch_add(pending, Ordering::Relaxed);
            tracing::warn!(
                bus = self.bus.name,
                pending,
                "consumer detached, discarded queued items"
            );
        } else {
            tracing::debug!(bus = self.bus.name, "consumer detached");
        }

        if let Ok(mut slot) = self.bus.rx.lock() {
            *slot = Some(rx);
        }
    }
}

fn drain<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> u64 {
    let mut count = 0;
    while rx.try_recv().is_ok() {
        count += 1;
    }
    count
}
