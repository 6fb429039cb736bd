//! Command service — the externally invocable command operations.
//!
//! Thin translation layer over the registry, the learning coordinator and
//! the transceiver capability. Automations and the wizard both go through
//! this surface.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use irhub_domain::code::IrCode;
use irhub_domain::error::{IrHubError, NotFoundError};
use irhub_domain::id::DeviceId;
use irhub_domain::remote::Command;

use crate::learning::LearningCoordinator;
use crate::ports::{SnapshotStore, Transceiver};
use crate::registry::CommandRegistry;

/// The four command operations, plus last-sent bookkeeping that feeds the
/// remote entity's current activity.
pub struct CommandService<S, T> {
    registry: Arc<CommandRegistry<S>>,
    coordinator: Arc<LearningCoordinator<S, T>>,
    transceiver: T,
    last_sent: Mutex<BTreeMap<DeviceId, String>>,
}

impl<S, T> CommandService<S, T>
where
    S: SnapshotStore + Send + Sync,
    T: Transceiver + Send + Sync,
{
    pub fn new(
        registry: Arc<CommandRegistry<S>>,
        coordinator: Arc<LearningCoordinator<S, T>>,
        transceiver: T,
    ) -> Self {
        Self {
            registry,
            coordinator,
            transceiver,
            last_sent: Mutex::new(BTreeMap::new()),
        }
    }

    /// Learn a command by capturing a code from the device's blaster.
    ///
    /// # Errors
    ///
    /// Fails with [`IrHubError::NotFound`] or [`IrHubError::Busy`] as the
    /// coordinator does; `LearnTimeout` and `LearnCancelled` are surfaced
    /// as outcomes for the caller to route into a retry.
    pub async fn learn_command(
        &self,
        device_id: DeviceId,
        command_name: &str,
        timeout: Duration,
    ) -> Result<Command, IrHubError> {
        self.coordinator
            .begin_learn(device_id, command_name, timeout)
            .await
    }

    /// Add a command from a base64-encoded code.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::InvalidPayload`] when the payload is empty or
    /// not valid base64, [`IrHubError::NotFound`] when the device is absent,
    /// or a storage error from persisting.
    #[tracing::instrument(skip(self, code_base64))]
    pub async fn add_command(
        &self,
        device_id: DeviceId,
        command_name: &str,
        code_base64: &str,
    ) -> Result<Command, IrHubError> {
        let code = IrCode::from_base64(code_base64)?;
        self.registry.put_command(device_id, command_name, code).await
    }

    /// Delete a command by name.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when the device or command is
    /// absent, or a storage error from persisting.
    pub async fn delete_command(
        &self,
        device_id: DeviceId,
        command_name: &str,
    ) -> Result<(), IrHubError> {
        self.registry.delete_command(device_id, command_name).await
    }

    /// Transmit a stored command through the device's blaster.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when the device or command is
    /// absent, or [`IrHubError::Transmit`] when the transceiver reports a
    /// failure.
    #[tracing::instrument(skip(self))]
    pub async fn send_command(
        &self,
        device_id: DeviceId,
        command_name: &str,
    ) -> Result<(), IrHubError> {
        let device = self.registry.get_device(device_id).await?;
        let command = device.command(command_name).ok_or_else(|| NotFoundError {
            entity: "Command",
            id: command_name.to_string(),
        })?;
        self.transceiver
            .transmit(&device.blaster, &command.code)
            .await?;
        tracing::info!(device = %device.name, command = %command.name, "command sent");
        self.last_sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(device_id, command.name.clone());
        Ok(())
    }

    /// The display name of the last command sent to `device_id`, if any.
    pub fn last_sent(&self, device_id: DeviceId) -> Option<String> {
        self.last_sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&device_id)
            .cloned()
    }
}
