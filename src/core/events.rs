//! Panel event definitions and subscription hub
//!
//! Events are raised on the session's background polling thread and
//! delivered synchronously to every subscriber there. Subscribers that need
//! another execution context must hand the event off themselves, for example
//! through [`EventHub::channel`].

use crate::fcu::keys::FcuKey;
use crate::mcdu::keys::McduKey;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Identifier of a physical button on any supported panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyId {
    Mcdu(McduKey),
    Fcu(FcuKey),
}

/// Events published by a device session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    /// Button went down
    KeyActivated(KeyId),

    /// Button came up
    KeyDeactivated(KeyId),

    /// Either ambient light sensor reading changed
    AmbientLightChanged { left: u16, right: u16, percent: u8 },

    /// Device stream closed or the device was unplugged
    Disconnected,
}

/// Handle returned by [`EventHub::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(&PanelEvent) + Send + Sync>;

/// Fan-out of panel events to subscribers
#[derive(Clone, Default)]
pub struct EventHub {
    subscribers: Arc<Mutex<Vec<(SubscriptionId, Callback)>>>,
    next_id: Arc<AtomicU64>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback, invoked on the polling thread
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&PanelEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscription; returns whether it existed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    /// Subscribe through an unbounded channel
    pub fn channel(&self) -> (SubscriptionId, mpsc::UnboundedReceiver<PanelEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.subscribe(move |event| {
            let _ = tx.send(event.clone());
        });
        (id, rx)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Deliver an event to every subscriber on the calling thread
    pub fn publish(&self, event: &PanelEvent) {
        // Snapshot so callbacks may (un)subscribe without deadlocking.
        let callbacks: Vec<Callback> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(event);
        }
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let hub = EventHub::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let id = hub.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        hub.publish(&PanelEvent::Disconnected);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        hub.publish(&PanelEvent::Disconnected);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_channel_delivery() {
        let hub = EventHub::new();
        let (_id, mut rx) = hub.channel();
        hub.publish(&PanelEvent::KeyActivated(KeyId::Mcdu(McduKey::McduMenu)));
        let event = tokio_test::block_on(rx.recv());
        assert_eq!(event, Some(PanelEvent::KeyActivated(KeyId::Mcdu(McduKey::McduMenu))));
    }
}
