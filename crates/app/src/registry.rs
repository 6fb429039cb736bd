//! Command registry — durable store of devices and their learned commands.
//!
//! All mutating operations are serialized behind one write lock, persist a
//! complete snapshot through the [`SnapshotStore`] port and commit in memory
//! only after the save succeeded. A failed save therefore never loses
//! previously committed state, and re-learning a command keeps the old code
//! until the new one is durably stored.

use std::collections::BTreeMap;

use tokio::sync::RwLock;

use irhub_domain::code::IrCode;
use irhub_domain::error::{ConflictError, IrHubError, NotFoundError};
use irhub_domain::id::DeviceId;
use irhub_domain::remote::{Command, VirtualRemote, normalized_name};
use irhub_domain::snapshot::RegistrySnapshot;

use crate::event_bus::{RegistryEvent, RegistryEvents};
use crate::ports::SnapshotStore;

/// The single source of truth for devices and commands.
pub struct CommandRegistry<S> {
    store: S,
    events: RegistryEvents,
    devices: RwLock<BTreeMap<DeviceId, VirtualRemote>>,
}

impl<S: SnapshotStore + Send + Sync> CommandRegistry<S> {
    /// Load the last complete snapshot from `store`.
    ///
    /// A missing snapshot starts empty; a corrupt one starts empty with a
    /// warning. Startup never fails because of persistence.
    pub async fn load(store: S) -> Self {
        let devices = match store.load().await {
            Ok(Some(snapshot)) => {
                tracing::info!(devices = snapshot.devices.len(), "registry loaded");
                snapshot.devices.into_iter().map(|d| (d.id, d)).collect()
            }
            Ok(None) => BTreeMap::new(),
            Err(err) => {
                tracing::warn!(error = %err, "snapshot unreadable, starting with an empty registry");
                BTreeMap::new()
            }
        };
        Self {
            store,
            events: RegistryEvents::default(),
            devices: RwLock::new(devices),
        }
    }

    /// Subscribe to committed registry mutations.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// All devices, ordered by normalized display name.
    pub async fn get_devices(&self) -> Vec<VirtualRemote> {
        let mut devices: Vec<VirtualRemote> = self.devices.read().await.values().cloned().collect();
        devices.sort_by_key(|d| normalized_name(&d.name));
        devices
    }

    /// Look up a device by id.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when no device with `id` exists.
    pub async fn get_device(&self, id: DeviceId) -> Result<VirtualRemote, IrHubError> {
        self.devices
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| device_not_found(id).into())
    }

    /// Look up a device by display name (case-insensitive, trimmed).
    pub async fn find_device_by_name(&self, name: &str) -> Option<VirtualRemote> {
        let key = normalized_name(name);
        self.devices
            .read()
            .await
            .values()
            .find(|d| normalized_name(&d.name) == key)
            .cloned()
    }

    /// Create a device with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::Validation`] when the trimmed name is empty,
    /// [`IrHubError::Conflict`] when the name is already used, or a storage
    /// error when the snapshot cannot be persisted.
    #[tracing::instrument(skip(self))]
    pub async fn create_device(
        &self,
        name: &str,
        blaster: &str,
    ) -> Result<VirtualRemote, IrHubError> {
        let device = VirtualRemote::new(name, blaster)?;
        let mut devices = self.devices.write().await;
        let key = normalized_name(&device.name);
        if devices.values().any(|d| normalized_name(&d.name) == key) {
            return Err(ConflictError {
                entity: "Device",
                name: device.name,
            }
            .into());
        }

        devices.insert(device.id, device.clone());
        if let Err(err) = self.persist(&devices).await {
            devices.remove(&device.id);
            return Err(err);
        }
        drop(devices);

        tracing::info!(device_id = %device.id, name = %device.name, "device created");
        self.events.publish(RegistryEvent::DeviceCreated(device.id));
        Ok(device)
    }

    /// Delete a device and, by composition, all its commands.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when the device is absent, or a
    /// storage error when the snapshot cannot be persisted.
    #[tracing::instrument(skip(self))]
    pub async fn delete_device(&self, id: DeviceId) -> Result<(), IrHubError> {
        let mut devices = self.devices.write().await;
        let Some(removed) = devices.remove(&id) else {
            return Err(device_not_found(id).into());
        };
        if let Err(err) = self.persist(&devices).await {
            devices.insert(id, removed);
            return Err(err);
        }
        drop(devices);

        tracing::info!(device_id = %id, "device deleted");
        self.events.publish(RegistryEvent::DeviceDeleted(id));
        Ok(())
    }

    /// Commands of a device, ordered by normalized name.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when the device is absent.
    pub async fn list_commands(&self, device_id: DeviceId) -> Result<Vec<Command>, IrHubError> {
        let devices = self.devices.read().await;
        let device = devices
            .get(&device_id)
            .ok_or_else(|| device_not_found(device_id))?;
        Ok(device.commands.values().cloned().collect())
    }

    /// Create or atomically replace a command.
    ///
    /// The previous code (if any) stays in place until the new snapshot is
    /// durably stored, so a failed save cannot lose it.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when the device is absent,
    /// [`IrHubError::Validation`] when the trimmed name is empty, or a
    /// storage error when the snapshot cannot be persisted.
    #[tracing::instrument(skip(self, code))]
    pub async fn put_command(
        &self,
        device_id: DeviceId,
        name: &str,
        code: IrCode,
    ) -> Result<Command, IrHubError> {
        let command = Command::new(name, code)?;
        let mut devices = self.devices.write().await;
        let device = devices
            .get_mut(&device_id)
            .ok_or_else(|| device_not_found(device_id))?;

        let previous = device.put_command(command.clone());
        if let Err(err) = self.persist(&devices).await {
            // roll the in-memory map back to the committed state
            let device = devices.get_mut(&device_id).expect("device present above");
            match previous {
                Some(prev) => {
                    device.put_command(prev);
                }
                None => {
                    device.remove_command(&command.name);
                }
            }
            return Err(err);
        }
        drop(devices);

        tracing::info!(device_id = %device_id, command = %command.name, "command stored");
        self.events.publish(RegistryEvent::CommandPut {
            device_id,
            name: command.key(),
        });
        Ok(command)
    }

    /// Delete a command by name.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when the device or command is
    /// absent, or a storage error when the snapshot cannot be persisted.
    #[tracing::instrument(skip(self))]
    pub async fn delete_command(&self, device_id: DeviceId, name: &str) -> Result<(), IrHubError> {
        let mut devices = self.devices.write().await;
        let device = devices
            .get_mut(&device_id)
            .ok_or_else(|| device_not_found(device_id))?;
        let Some(removed) = device.remove_command(name) else {
            return Err(NotFoundError {
                entity: "Command",
                id: name.trim().to_string(),
            }
            .into());
        };
        if let Err(err) = self.persist(&devices).await {
            let device = devices.get_mut(&device_id).expect("device present above");
            device.put_command(removed);
            return Err(err);
        }
        drop(devices);

        tracing::info!(device_id = %device_id, command = %name, "command deleted");
        self.events.publish(RegistryEvent::CommandDeleted {
            device_id,
            name: normalized_name(name),
        });
        Ok(())
    }

    /// Write the full snapshot. Callers hold the write lock, so persists
    /// are strictly ordered.
    async fn persist(&self, devices: &BTreeMap<DeviceId, VirtualRemote>) -> Result<(), IrHubError> {
        let mut list: Vec<VirtualRemote> = devices.values().cloned().collect();
        list.sort_by_key(|d| normalized_name(&d.name));
        self.store.save(&RegistrySnapshot::new(list)).await
    }
}

fn device_not_found(id: DeviceId) -> NotFoundError {
    NotFoundError {
        entity: "Device",
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MemoryStore;

    fn code(bytes: &[u8]) -> IrCode {
        IrCode::new(bytes.to_vec()).unwrap()
    }

    async fn registry() -> CommandRegistry<MemoryStore> {
        CommandRegistry::load(MemoryStore::default()).await
    }

    #[tokio::test]
    async fn should_start_empty_when_no_snapshot_exists() {
        let registry = registry().await;
        assert!(registry.get_devices().await.is_empty());
    }

    #[tokio::test]
    async fn should_start_empty_when_snapshot_is_corrupt() {
        let store = MemoryStore::corrupt();
        let registry = CommandRegistry::load(store).await;
        assert!(registry.get_devices().await.is_empty());
    }

    #[tokio::test]
    async fn should_create_device_and_persist_snapshot() {
        let registry = registry().await;
        let device = registry
            .create_device("Toilet", "remote.blaster_x")
            .await
            .unwrap();

        assert_eq!(device.name, "Toilet");
        let snapshot = registry.store.saved().unwrap();
        assert_eq!(snapshot.devices.len(), 1);
        assert_eq!(snapshot.devices[0].name, "Toilet");
    }

    #[tokio::test]
    async fn should_reject_duplicate_device_name_case_insensitively() {
        let registry = registry().await;
        registry.create_device("Toilet", "b").await.unwrap();

        let result = registry.create_device("  TOILET ", "b").await;
        assert!(matches!(result, Err(IrHubError::Conflict(_))));
        assert_eq!(registry.get_devices().await.len(), 1);
    }

    #[tokio::test]
    async fn should_reject_empty_device_name_after_trim() {
        let registry = registry().await;
        let result = registry.create_device("   ", "b").await;
        assert!(matches!(result, Err(IrHubError::Validation(_))));
    }

    #[tokio::test]
    async fn should_order_devices_by_name() {
        let registry = registry().await;
        registry.create_device("tv", "b").await.unwrap();
        registry.create_device("Aircon", "b").await.unwrap();

        let names: Vec<String> = registry
            .get_devices()
            .await
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, ["Aircon", "tv"]);
    }

    #[tokio::test]
    async fn should_return_not_found_when_deleting_unknown_device() {
        let registry = registry().await;
        let result = registry.delete_device(DeviceId::new()).await;
        assert!(matches!(result, Err(IrHubError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_delete_device_with_all_its_commands() {
        let registry = registry().await;
        let device = registry.create_device("TV", "b").await.unwrap();
        registry
            .put_command(device.id, "Power", code(&[1]))
            .await
            .unwrap();

        registry.delete_device(device.id).await.unwrap();

        assert!(registry.get_devices().await.is_empty());
        assert!(registry.store.saved().unwrap().devices.is_empty());
    }

    #[tokio::test]
    async fn should_put_command_idempotently_under_retry() {
        let registry = registry().await;
        let device = registry.create_device("TV", "b").await.unwrap();

        registry
            .put_command(device.id, "Power", code(&[0xAA]))
            .await
            .unwrap();
        let first = registry.store.saved().unwrap();
        registry
            .put_command(device.id, "Power", code(&[0xAA]))
            .await
            .unwrap();
        let second = registry.store.saved().unwrap();

        assert_eq!(first.devices[0].commands, second.devices[0].commands);
        assert_eq!(registry.list_commands(device.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_replace_command_code_when_name_reused() {
        let registry = registry().await;
        let device = registry.create_device("TV", "b").await.unwrap();
        registry
            .put_command(device.id, "Power", code(&[1]))
            .await
            .unwrap();
        registry
            .put_command(device.id, "power", code(&[2]))
            .await
            .unwrap();

        let commands = registry.list_commands(device.id).await.unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].code, code(&[2]));
    }

    #[tokio::test]
    async fn should_keep_old_code_when_save_fails_during_replace() {
        let registry = registry().await;
        let device = registry.create_device("TV", "b").await.unwrap();
        registry
            .put_command(device.id, "Power", code(&[1]))
            .await
            .unwrap();

        registry.store.fail_next_save();
        let result = registry.put_command(device.id, "Power", code(&[2])).await;
        assert!(matches!(result, Err(IrHubError::Storage(_))));

        let commands = registry.list_commands(device.id).await.unwrap();
        assert_eq!(commands[0].code, code(&[1]));
        assert_eq!(registry.store.saved().unwrap().devices[0].commands.len(), 1);
    }

    #[tokio::test]
    async fn should_not_keep_device_when_save_fails_during_create() {
        let registry = registry().await;
        registry.store.fail_next_save();

        let result = registry.create_device("TV", "b").await;
        assert!(matches!(result, Err(IrHubError::Storage(_))));
        assert!(registry.get_devices().await.is_empty());
    }

    #[tokio::test]
    async fn should_return_not_found_when_deleting_command_from_empty_device() {
        let registry = registry().await;
        let device = registry.create_device("TV", "b").await.unwrap();

        let result = registry.delete_command(device.id, "Power").await;
        assert!(matches!(result, Err(IrHubError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_publish_events_for_each_mutation() {
        let registry = registry().await;
        let mut rx = registry.subscribe();

        let device = registry.create_device("TV", "b").await.unwrap();
        registry
            .put_command(device.id, "Power", code(&[1]))
            .await
            .unwrap();
        registry.delete_command(device.id, "Power").await.unwrap();
        registry.delete_device(device.id).await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            RegistryEvent::DeviceCreated(device.id)
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            RegistryEvent::CommandPut {
                device_id: device.id,
                name: "power".to_string()
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            RegistryEvent::CommandDeleted {
                device_id: device.id,
                name: "power".to_string()
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            RegistryEvent::DeviceDeleted(device.id)
        );
    }

    #[tokio::test]
    async fn should_reload_identical_graph_from_persisted_snapshot() {
        let store = MemoryStore::default();
        let registry = CommandRegistry::load(store.clone()).await;
        let device = registry.create_device("Toilet", "b").await.unwrap();
        registry
            .put_command(device.id, "Power", code(&[0xAA, 0xBB, 0xCC]))
            .await
            .unwrap();
        let before = registry.get_devices().await;

        let reloaded = CommandRegistry::load(store).await;
        assert_eq!(reloaded.get_devices().await, before);
    }

    // Property-style test: device name uniqueness holds at every point of a
    // random create/delete sequence.
    #[tokio::test]
    async fn should_keep_device_names_unique_across_random_operation_sequences() {
        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed
        };

        let names = ["tv", "TV", "Aircon", "aircon ", "Fan", "  fan"];
        let registry = registry().await;

        for _ in 0..200 {
            #[allow(clippy::cast_possible_truncation)]
            let roll = next() as usize;
            let name = names[roll % names.len()];
            if roll % 3 == 0 {
                if let Some(existing) = registry.find_device_by_name(name).await {
                    registry.delete_device(existing.id).await.unwrap();
                }
            } else {
                let _ = registry.create_device(name, "b").await;
            }

            let devices = registry.get_devices().await;
            let mut keys: Vec<String> =
                devices.iter().map(|d| normalized_name(&d.name)).collect();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), devices.len(), "duplicate device names");
        }
    }
}
