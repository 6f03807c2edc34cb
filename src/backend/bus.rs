//! Notification bus
//!
//! [`EventBus`] is the listen/unlisten surface of the desktop event system.
//! [`LocalEventBus`] is an in-process implementation used when the tracker
//! runs next to the backend (and in tests). [`Subscription`] unregisters its
//! handler when dropped.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub type ListenerId = u64;

/// Handler invoked with the raw JSON payload of an event
pub type EventHandler = Arc<dyn Fn(&str) + Send + Sync>;

pub trait EventBus: Send + Sync {
    fn listen(&self, channel: &str, handler: EventHandler) -> ListenerId;
    fn unlisten(&self, id: ListenerId);
}

#[derive(Default)]
pub struct LocalEventBus {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<String, Vec<(ListenerId, EventHandler)>>>,
}

impl LocalEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize `payload` and deliver it to every listener on `channel`.
    ///
    /// Returns the number of handlers invoked.
    pub fn emit<T: Serialize>(&self, channel: &str, payload: &T) -> usize {
        match serde_json::to_string(payload) {
            Ok(json) => self.emit_raw(channel, &json),
            Err(e) => {
                log::warn!("[EventBus] Failed to serialize payload for '{}': {}", channel, e);
                0
            }
        }
    }

    pub fn emit_raw(&self, channel: &str, payload: &str) -> usize {
        // Handlers run outside the lock so they may (un)listen themselves
        let handlers: Vec<EventHandler> = match self.listeners.lock() {
            Ok(listeners) => listeners
                .get(channel)
                .map(|list| list.iter().map(|(_, h)| h.clone()).collect())
                .unwrap_or_default(),
            Err(_) => {
                log::error!("[EventBus] Listener registry poisoned, dropping '{}'", channel);
                return 0;
            }
        };

        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        self.listeners
            .lock()
            .map(|l| l.get(channel).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }
}

impl EventBus for LocalEventBus {
    fn listen(&self, channel: &str, handler: EventHandler) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners
                .entry(channel.to_string())
                .or_default()
                .push((id, handler));
        }
        log::debug!("[EventBus] Listener {} registered on '{}'", id, channel);
        id
    }

    fn unlisten(&self, id: ListenerId) {
        if let Ok(mut listeners) = self.listeners.lock() {
            for list in listeners.values_mut() {
                list.retain(|(listener_id, _)| *listener_id != id);
            }
            listeners.retain(|_, list| !list.is_empty());
        }
        log::debug!("[EventBus] Listener {} removed", id);
    }
}

/// A registered handler. Unregisters on drop.
pub struct Subscription {
    bus: Arc<dyn EventBus>,
    channel: String,
    id: Option<ListenerId>,
}

impl Subscription {
    pub fn new(bus: Arc<dyn EventBus>, channel: &str, handler: EventHandler) -> Self {
        let id = bus.listen(channel, handler);
        Self {
            bus,
            channel: channel.to_string(),
            id: Some(id),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    pub fn cancel(&mut self) {
        if let Some(id) = self.id.take() {
            self.bus.unlisten(id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
