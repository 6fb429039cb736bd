//! JSON REST handler for the exposed entity set.

use axum::Json;
use axum::extract::State;

use irhub_app::ports::{EntityHost, SnapshotStore, Transceiver};
use irhub_domain::entity::ExposedEntity;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/entities`
pub async fn list<S, T, H>(
    State(state): State<AppState<S, T, H>>,
) -> Result<Json<Vec<ExposedEntity>>, ApiError>
where
    S: SnapshotStore + Send + Sync + 'static,
    T: Transceiver + Send + Sync + 'static,
    H: EntityHost + Send + Sync + 'static,
{
    Ok(Json(state.entity_host.list().await))
}
