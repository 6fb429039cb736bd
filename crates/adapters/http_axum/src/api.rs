//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod commands;
#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod entities;
#[allow(clippy::missing_errors_doc)]
pub mod learn;
#[allow(clippy::missing_errors_doc)]
pub mod wizard;

use std::str::FromStr;

use axum::Router;
use axum::routing::{get, post};

use irhub_app::ports::{EntityHost, SnapshotStore, Transceiver};
use irhub_domain::error::{IrHubError, NotFoundError};
use irhub_domain::id::DeviceId;

use crate::error::ApiError;
use crate::state::AppState;

/// Parse a device id from a path segment.
///
/// A malformed id cannot reference any device, so it maps to the same 404
/// a well-formed but unknown id would produce.
pub(crate) fn parse_device_id(raw: &str) -> Result<DeviceId, ApiError> {
    DeviceId::from_str(raw).map_err(|_| {
        ApiError::from(IrHubError::from(NotFoundError {
            entity: "Device",
            id: raw.to_string(),
        }))
    })
}

/// Build the `/api` sub-router.
pub fn routes<S, T, H>() -> Router<AppState<S, T, H>>
where
    S: SnapshotStore + Send + Sync + 'static,
    T: Transceiver + Send + Sync + 'static,
    H: EntityHost + Send + Sync + 'static,
{
    Router::new()
        // Devices
        .route(
            "/devices",
            get(devices::list::<S, T, H>).post(devices::create::<S, T, H>),
        )
        .route(
            "/devices/{id}",
            get(devices::get::<S, T, H>).delete(devices::delete::<S, T, H>),
        )
        // Commands
        .route(
            "/devices/{id}/commands",
            get(commands::list::<S, T, H>).post(commands::add::<S, T, H>),
        )
        .route(
            "/devices/{id}/commands/learn",
            post(commands::learn::<S, T, H>),
        )
        .route(
            "/devices/{id}/commands/{name}",
            axum::routing::delete(commands::delete::<S, T, H>),
        )
        .route(
            "/devices/{id}/commands/{name}/send",
            post(commands::send::<S, T, H>),
        )
        // Learning session
        .route("/learn", get(learn::active::<S, T, H>))
        .route("/learn/cancel", post(learn::cancel::<S, T, H>))
        // Entities
        .route("/entities", get(entities::list::<S, T, H>))
        // Wizard
        .route(
            "/wizard",
            get(wizard::view::<S, T, H>).post(wizard::submit::<S, T, H>),
        )
        .route("/wizard/reset", post(wizard::reset::<S, T, H>))
}
