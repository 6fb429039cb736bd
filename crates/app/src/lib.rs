//! # irhub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `SnapshotStore` — durable registry snapshot persistence
//!   - `Transceiver` — the external IR learn/transmit capability
//!   - `EntityHost` — the externally exposed entity set
//! - Provide the core components:
//!   - [`registry::CommandRegistry`] — single source of truth for devices/commands
//!   - [`learning::LearningCoordinator`] — one learn interaction at a time
//!   - [`wizard::SetupWizard`] — the setup/management flow state machine
//!   - [`sync::EntitySynchronizer`] — registry → entity reconciliation loop
//!   - [`services::command_service::CommandService`] — the four invocable operations
//! - Provide **in-process infrastructure** (registry event bus, in-memory
//!   entity host) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `irhub-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod entity_host;
pub mod event_bus;
pub mod learning;
pub mod ports;
pub mod registry;
pub mod services;
pub mod sync;
pub mod wizard;

#[cfg(test)]
pub(crate) mod test_util;
