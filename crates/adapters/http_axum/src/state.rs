//! Shared application state for axum handlers.

use std::sync::Arc;
use std::time::Duration;

use irhub_app::learning::LearningCoordinator;
use irhub_app::ports::{EntityHost, SnapshotStore, Transceiver};
use irhub_app::registry::CommandRegistry;
use irhub_app::services::command_service::CommandService;
use irhub_app::wizard::SetupWizard;

/// Application state shared across all axum handlers.
///
/// Generic over the snapshot store, transceiver, and entity host types to
/// avoid dynamic dispatch. `Clone` is implemented manually so the
/// underlying types themselves do not need to be `Clone` — only the `Arc`
/// wrappers are cloned.
pub struct AppState<S, T, H> {
    /// Source of truth for devices and commands.
    pub registry: Arc<CommandRegistry<S>>,
    /// Single-session learn orchestration.
    pub coordinator: Arc<LearningCoordinator<S, T>>,
    /// The four invocable command operations.
    pub command_service: Arc<CommandService<S, T>>,
    /// Setup/management flow.
    pub wizard: Arc<SetupWizard<S, T>>,
    /// Externally exposed entity set, served read-only.
    pub entity_host: Arc<H>,
    /// Deadline applied to learn requests that do not specify one.
    pub learn_timeout: Duration,
}

impl<S, T, H> Clone for AppState<S, T, H> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            coordinator: Arc::clone(&self.coordinator),
            command_service: Arc::clone(&self.command_service),
            wizard: Arc::clone(&self.wizard),
            entity_host: Arc::clone(&self.entity_host),
            learn_timeout: self.learn_timeout,
        }
    }
}

impl<S, T, H> AppState<S, T, H>
where
    S: SnapshotStore + Send + Sync + 'static,
    T: Transceiver + Send + Sync + 'static,
    H: EntityHost + Send + Sync + 'static,
{
    /// Create application state from pre-wrapped `Arc` components.
    ///
    /// Components are shared with background tasks (entity sync) before the
    /// HTTP state is constructed, hence `Arc` here rather than owned values.
    pub fn new(
        registry: Arc<CommandRegistry<S>>,
        coordinator: Arc<LearningCoordinator<S, T>>,
        command_service: Arc<CommandService<S, T>>,
        wizard: Arc<SetupWizard<S, T>>,
        entity_host: Arc<H>,
        learn_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            coordinator,
            command_service,
            wizard,
            entity_host,
            learn_timeout,
        }
    }
}
