//! JSON REST handlers for the process-wide learning session.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use irhub_app::learning::LearningSession;
use irhub_app::ports::{EntityHost, SnapshotStore, Transceiver};

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for the cancel endpoint.
#[derive(Serialize)]
pub struct CancelResponse {
    /// Whether a session was active and has been told to stop.
    pub cancelled: bool,
}

/// `GET /api/learn` — the active session, or `null`.
pub async fn active<S, T, H>(
    State(state): State<AppState<S, T, H>>,
) -> Result<Json<Option<LearningSession>>, ApiError>
where
    S: SnapshotStore + Send + Sync + 'static,
    T: Transceiver + Send + Sync + 'static,
    H: EntityHost + Send + Sync + 'static,
{
    Ok(Json(state.coordinator.active_session()))
}

/// `POST /api/learn/cancel`
pub async fn cancel<S, T, H>(
    State(state): State<AppState<S, T, H>>,
) -> Result<Json<CancelResponse>, ApiError>
where
    S: SnapshotStore + Send + Sync + 'static,
    T: Transceiver + Send + Sync + 'static,
    H: EntityHost + Send + Sync + 'static,
{
    let cancelled = state.coordinator.cancel_active();
    Ok(Json(CancelResponse { cancelled }))
}
