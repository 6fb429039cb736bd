//! # irhubd — irhub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Construct the snapshot store and load the registry
//! - Construct the virtual transceiver, coordinator, wizard, and services
//! - Spawn the entity synchronizer and run an initial reconciliation
//! - Build the axum router, bind to a TCP port, and serve
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use irhub_adapter_http_axum::state::AppState;
use irhub_adapter_storage_json::JsonSnapshotStore;
use irhub_adapter_virtual::VirtualTransceiver;
use irhub_app::entity_host::InMemoryEntityHost;
use irhub_app::learning::LearningCoordinator;
use irhub_app::registry::CommandRegistry;
use irhub_app::services::command_service::CommandService;
use irhub_app::sync::{EntitySynchronizer, spawn_on_events};
use irhub_app::wizard::SetupWizard;

use config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Storage + registry
    let store = JsonSnapshotStore::new(&config.storage.path);
    let registry = Arc::new(CommandRegistry::load(store).await);

    // Transceiver
    let transceiver = Arc::new(VirtualTransceiver::default());

    // Application components
    let coordinator = Arc::new(LearningCoordinator::new(
        Arc::clone(&registry),
        Arc::clone(&transceiver),
    ));
    let command_service = Arc::new(CommandService::new(
        Arc::clone(&registry),
        Arc::clone(&coordinator),
        Arc::clone(&transceiver),
    ));
    let wizard = Arc::new(SetupWizard::new(
        Arc::clone(&registry),
        Arc::clone(&coordinator),
        Arc::clone(&transceiver),
        config.learn_timeout(),
    ));

    // Entity reconciliation: one pass for the loaded snapshot, then
    // event-driven for every registry mutation.
    let entity_host = Arc::new(InMemoryEntityHost::default());
    let synchronizer = Arc::new(EntitySynchronizer::new(
        Arc::clone(&registry),
        Arc::clone(&entity_host),
    ));
    let sync_task = spawn_on_events(Arc::clone(&synchronizer));
    synchronizer.request_sync().await?;

    // HTTP
    let state = AppState::new(
        registry,
        coordinator,
        command_service,
        wizard,
        entity_host,
        config.learn_timeout(),
    );
    let app = irhub_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    tracing::info!(addr = %bind_addr, "irhubd listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sync_task.abort();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
    }
}
