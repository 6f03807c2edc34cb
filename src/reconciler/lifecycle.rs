//! Subscription lifecycle for the reconciler
//!
//! Registering for notifications yields a [`SubscriptionSet`]. Releasing it
//! (explicitly or by dropping it) unregisters every handler and flips the
//! liveness flag so responses that arrive afterwards are ignored.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::backend::bus::Subscription;

pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
    alive: Arc<AtomicBool>,
    /// Task draining the notification queue; ends once every handler is gone
    pump: Option<JoinHandle<()>>,
}

impl SubscriptionSet {
    pub fn new(subscriptions: Vec<Subscription>, alive: Arc<AtomicBool>, pump: JoinHandle<()>) -> Self {
        Self {
            subscriptions,
            alive,
            pump: Some(pump),
        }
    }

    pub fn is_active(&self) -> bool {
        self.pump.is_some()
    }

    pub fn channels(&self) -> Vec<&str> {
        self.subscriptions.iter().map(|s| s.channel()).collect()
    }

    /// Unregister every handler. Safe to call more than once.
    pub fn release(&mut self) {
        let Some(pump) = self.pump.take() else {
            return;
        };

        self.alive.store(false, Ordering::SeqCst);
        let count = self.subscriptions.len();
        for subscription in self.subscriptions.iter_mut() {
            subscription.cancel();
        }
        self.subscriptions.clear();
        // Dropping the handlers closes the queue; the pump exits on its own
        drop(pump);

        log::info!("[StatusReconciler] Released {} notification subscriptions", count);
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.release();
    }
}
