//! In-process registry change bus backed by a tokio broadcast channel.
//!
//! Every committed registry mutation publishes one [`RegistryEvent`]; the
//! entity synchronizer subscribes and reconciles in response.

use tokio::sync::broadcast;

use irhub_domain::id::DeviceId;

/// A committed registry mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    DeviceCreated(DeviceId),
    DeviceDeleted(DeviceId),
    CommandPut {
        device_id: DeviceId,
        /// Normalized command name.
        name: String,
    },
    CommandDeleted {
        device_id: DeviceId,
        /// Normalized command name.
        name: String,
    },
}

/// Broadcast bus for registry events.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped).
#[derive(Debug)]
pub struct RegistryEvents {
    sender: broadcast::Sender<RegistryEvent>,
}

impl RegistryEvents {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events published *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: RegistryEvent) {
        // send fails only when there are zero receivers, which is fine.
        let _ = self.sender.send(event);
    }
}

impl Default for RegistryEvents {
    fn default() -> Self {
        Self::new(64)
    }
}
