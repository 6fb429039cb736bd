//! Learning coordinator — one learn interaction at a time.
//!
//! Learning waits for a single physical button press, so it cannot be
//! multiplexed: a second `begin_learn` while one is outstanding fails fast
//! with `Busy` instead of queuing. The coordinator enforces the deadline
//! itself, independent of whether the transceiver honors it, so a
//! non-cooperating transceiver cannot wedge the process.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::oneshot;

use irhub_domain::error::{BusyError, IrHubError, NotFoundError, ValidationError};
use irhub_domain::id::{DeviceId, SessionId};
use irhub_domain::remote::Command;
use irhub_domain::time::{Timestamp, now};

use crate::ports::{LearnReply, SnapshotStore, Transceiver};
use crate::registry::CommandRegistry;

/// Observable state of the (at most one) active learning session.
///
/// Never persisted — sessions do not survive a restart.
#[derive(Debug, Clone, Serialize)]
pub struct LearningSession {
    pub id: SessionId,
    pub device_id: DeviceId,
    pub command_name: String,
    pub started_at: Timestamp,
    pub deadline: Timestamp,
}

struct ActiveSession {
    info: LearningSession,
    cancel: Option<oneshot::Sender<()>>,
}

/// Orchestrates learn interactions against the transceiver capability.
pub struct LearningCoordinator<S, T> {
    registry: Arc<CommandRegistry<S>>,
    transceiver: T,
    active: Mutex<Option<ActiveSession>>,
}

impl<S, T> LearningCoordinator<S, T>
where
    S: SnapshotStore + Send + Sync,
    T: Transceiver + Send + Sync,
{
    pub fn new(registry: Arc<CommandRegistry<S>>, transceiver: T) -> Self {
        Self {
            registry,
            transceiver,
            active: Mutex::new(None),
        }
    }

    /// Run one learn interaction to completion and store the captured code.
    ///
    /// Resolves when the transceiver returns a code, the deadline passes,
    /// or the session is cancelled through [`cancel_learn`](Self::cancel_learn).
    /// The session slot is freed on every exit path.
    ///
    /// # Errors
    ///
    /// - [`IrHubError::NotFound`] — unknown device
    /// - [`IrHubError::Validation`] — empty command name after trimming
    /// - [`IrHubError::Busy`] — another session is active
    /// - [`IrHubError::LearnTimeout`] / [`IrHubError::LearnCancelled`] —
    ///   learning outcomes, routed back into the wizard retry path
    /// - storage errors from persisting the learned command
    #[tracing::instrument(skip(self))]
    pub async fn begin_learn(
        &self,
        device_id: DeviceId,
        command_name: &str,
        timeout: Duration,
    ) -> Result<Command, IrHubError> {
        let name = command_name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let device = self.registry.get_device(device_id).await?;

        let (cancel_tx, mut cancel_rx) = oneshot::channel();
        let started_at = now();
        let deadline = chrono::Duration::from_std(timeout)
            .ok()
            .and_then(|window| started_at.checked_add_signed(window))
            .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC);
        let session = LearningSession {
            id: SessionId::new(),
            device_id,
            command_name: name.to_string(),
            started_at,
            deadline,
        };

        {
            let mut slot = self.lock_slot();
            if let Some(active) = slot.as_ref() {
                return Err(BusyError {
                    pending_command: active.info.command_name.clone(),
                }
                .into());
            }
            *slot = Some(ActiveSession {
                info: session.clone(),
                cancel: Some(cancel_tx),
            });
        }
        let _guard = SlotGuard { slot: &self.active };

        tracing::info!(
            session_id = %session.id,
            device = %device.name,
            command = %name,
            "learning started"
        );

        let outcome = tokio::select! {
            reply = self.transceiver.request_learn(&device.blaster, timeout) => {
                match reply? {
                    LearnReply::Code(code) => Ok(code),
                    LearnReply::Timeout => Err(IrHubError::LearnTimeout),
                }
            }
            () = tokio::time::sleep(timeout) => Err(IrHubError::LearnTimeout),
            _ = &mut cancel_rx => Err(IrHubError::LearnCancelled),
        };

        match outcome {
            Ok(code) => {
                let command = self.registry.put_command(device_id, name, code).await?;
                tracing::info!(command = %command.name, "learning succeeded");
                Ok(command)
            }
            Err(err) => {
                tracing::info!(outcome = %err, "learning ended without a code");
                // tell the blaster to stop listening, best effort
                self.transceiver.stop_learn(&device.blaster).await;
                Err(err)
            }
        }
    }

    /// Cancel the session identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`IrHubError::NotFound`] when no session with `id` is active.
    pub fn cancel_learn(&self, id: SessionId) -> Result<(), IrHubError> {
        let mut slot = self.lock_slot();
        match slot.as_mut() {
            Some(active) if active.info.id == id => {
                if let Some(tx) = active.cancel.take() {
                    let _ = tx.send(());
                }
                Ok(())
            }
            _ => Err(NotFoundError {
                entity: "Session",
                id: id.to_string(),
            }
            .into()),
        }
    }

    /// Cancel whatever session is active. Returns whether one was.
    pub fn cancel_active(&self) -> bool {
        let mut slot = self.lock_slot();
        match slot.as_mut() {
            Some(active) => {
                if let Some(tx) = active.cancel.take() {
                    let _ = tx.send(());
                }
                true
            }
            None => false,
        }
    }

    /// The currently active session, if any.
    pub fn active_session(&self) -> Option<LearningSession> {
        self.lock_slot().as_ref().map(|a| a.info.clone())
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Frees the session slot when the learn future completes or is dropped.
struct SlotGuard<'a> {
    slot: &'a Mutex<Option<ActiveSession>>,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{MemoryStore, ScriptedReply, ScriptedTransceiver};
    use irhub_domain::code::IrCode;

    const SHORT: Duration = Duration::from_millis(20);

    fn code(bytes: &[u8]) -> IrCode {
        IrCode::new(bytes.to_vec()).unwrap()
    }

    async fn setup() -> (
        Arc<CommandRegistry<MemoryStore>>,
        Arc<ScriptedTransceiver>,
        Arc<LearningCoordinator<MemoryStore, Arc<ScriptedTransceiver>>>,
        DeviceId,
    ) {
        let registry = Arc::new(CommandRegistry::load(MemoryStore::default()).await);
        let transceiver = Arc::new(ScriptedTransceiver::default());
        let coordinator = Arc::new(LearningCoordinator::new(
            Arc::clone(&registry),
            Arc::clone(&transceiver),
        ));
        let device = registry
            .create_device("Toilet", "remote.blaster_x")
            .await
            .unwrap();
        (registry, transceiver, coordinator, device.id)
    }

    #[tokio::test]
    async fn should_store_command_when_code_is_captured() {
        let (registry, transceiver, coordinator, device_id) = setup().await;
        transceiver.script(ScriptedReply::Code(code(&[0xAA, 0xBB, 0xCC])));

        let command = coordinator
            .begin_learn(device_id, "Power", SHORT)
            .await
            .unwrap();

        assert_eq!(command.name, "Power");
        assert_eq!(command.code, code(&[0xAA, 0xBB, 0xCC]));
        let commands = registry.list_commands(device_id).await.unwrap();
        assert_eq!(commands.len(), 1);
        assert!(coordinator.active_session().is_none());
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_device() {
        let (_registry, _transceiver, coordinator, _device_id) = setup().await;
        let result = coordinator
            .begin_learn(DeviceId::new(), "Power", SHORT)
            .await;
        assert!(matches!(result, Err(IrHubError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_reject_empty_command_name() {
        let (_registry, _transceiver, coordinator, device_id) = setup().await;
        let result = coordinator.begin_learn(device_id, "   ", SHORT).await;
        assert!(matches!(result, Err(IrHubError::Validation(_))));
    }

    #[tokio::test]
    async fn should_time_out_when_transceiver_reports_no_signal() {
        let (registry, transceiver, coordinator, device_id) = setup().await;
        transceiver.script(ScriptedReply::Timeout);

        let result = coordinator.begin_learn(device_id, "Power", SHORT).await;

        assert!(matches!(result, Err(IrHubError::LearnTimeout)));
        assert!(registry.list_commands(device_id).await.unwrap().is_empty());
        assert!(coordinator.active_session().is_none());
    }

    #[tokio::test]
    async fn should_enforce_deadline_when_transceiver_never_answers() {
        let (registry, transceiver, coordinator, device_id) = setup().await;
        transceiver.script(ScriptedReply::Hang);

        let result = coordinator.begin_learn(device_id, "Power", SHORT).await;

        assert!(matches!(result, Err(IrHubError::LearnTimeout)));
        assert_eq!(transceiver.stop_count(), 1);
        assert!(registry.list_commands(device_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_fail_fast_with_busy_while_session_is_active() {
        let (registry, transceiver, coordinator, device_id) = setup().await;
        let other = registry.create_device("TV", "remote.blaster_x").await.unwrap();
        transceiver.script(ScriptedReply::Delayed(
            Duration::from_millis(50),
            code(&[1]),
        ));

        let first = tokio::spawn({
            let coordinator = Arc::clone(&coordinator);
            async move {
                coordinator
                    .begin_learn(device_id, "Power", Duration::from_secs(5))
                    .await
            }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        // concurrent attempt for a different device still fails fast
        let second = coordinator.begin_learn(other.id, "Mute", SHORT).await;
        assert!(matches!(second, Err(IrHubError::Busy(_))));

        // the first session is unaffected
        let command = first.await.unwrap().unwrap();
        assert_eq!(command.name, "Power");
    }

    #[tokio::test]
    async fn should_cancel_active_session() {
        let (registry, transceiver, coordinator, device_id) = setup().await;
        transceiver.script(ScriptedReply::Hang);

        let learn = tokio::spawn({
            let coordinator = Arc::clone(&coordinator);
            async move {
                coordinator
                    .begin_learn(device_id, "Power", Duration::from_secs(5))
                    .await
            }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let session = coordinator.active_session().unwrap();
        coordinator.cancel_learn(session.id).unwrap();

        let result = learn.await.unwrap();
        assert!(matches!(result, Err(IrHubError::LearnCancelled)));
        assert_eq!(transceiver.stop_count(), 1);
        assert!(registry.list_commands(device_id).await.unwrap().is_empty());
        assert!(coordinator.active_session().is_none());
    }

    #[tokio::test]
    async fn should_return_not_found_when_cancelling_unknown_session() {
        let (_registry, _transceiver, coordinator, _device_id) = setup().await;
        let result = coordinator.cancel_learn(SessionId::new());
        assert!(matches!(result, Err(IrHubError::NotFound(_))));
        assert!(!coordinator.cancel_active());
    }

    #[tokio::test]
    async fn should_allow_new_session_after_previous_completed() {
        let (_registry, transceiver, coordinator, device_id) = setup().await;
        transceiver.script(ScriptedReply::Timeout);
        let _ = coordinator.begin_learn(device_id, "Power", SHORT).await;

        transceiver.script(ScriptedReply::Code(code(&[2])));
        let command = coordinator
            .begin_learn(device_id, "Power", SHORT)
            .await
            .unwrap();
        assert_eq!(command.code, code(&[2]));
    }

    #[tokio::test]
    async fn should_replace_existing_command_silently_when_relearning() {
        let (registry, transceiver, coordinator, device_id) = setup().await;
        registry
            .put_command(device_id, "Power", code(&[1]))
            .await
            .unwrap();
        transceiver.script(ScriptedReply::Code(code(&[9])));

        coordinator
            .begin_learn(device_id, "Power", SHORT)
            .await
            .unwrap();

        let commands = registry.list_commands(device_id).await.unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].code, code(&[9]));
    }
}
