//! JSON REST handlers for devices.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use irhub_app::ports::{EntityHost, SnapshotStore, Transceiver};
use irhub_domain::remote::VirtualRemote;

use crate::error::ApiError;
use crate::state::AppState;

use super::parse_device_id;

/// Request body for creating a device.
#[derive(Deserialize)]
pub struct CreateDeviceRequest {
    pub name: String,
    pub blaster: String,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<VirtualRemote>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<VirtualRemote>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<VirtualRemote>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/devices`
pub async fn list<S, T, H>(State(state): State<AppState<S, T, H>>) -> Result<ListResponse, ApiError>
where
    S: SnapshotStore + Send + Sync + 'static,
    T: Transceiver + Send + Sync + 'static,
    H: EntityHost + Send + Sync + 'static,
{
    let devices = state.registry.get_devices().await;
    Ok(ListResponse::Ok(Json(devices)))
}

/// `GET /api/devices/{id}`
pub async fn get<S, T, H>(
    State(state): State<AppState<S, T, H>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    S: SnapshotStore + Send + Sync + 'static,
    T: Transceiver + Send + Sync + 'static,
    H: EntityHost + Send + Sync + 'static,
{
    let device_id = parse_device_id(&id)?;
    let device = state.registry.get_device(device_id).await?;
    Ok(GetResponse::Ok(Json(device)))
}

/// `POST /api/devices`
pub async fn create<S, T, H>(
    State(state): State<AppState<S, T, H>>,
    Json(req): Json<CreateDeviceRequest>,
) -> Result<CreateResponse, ApiError>
where
    S: SnapshotStore + Send + Sync + 'static,
    T: Transceiver + Send + Sync + 'static,
    H: EntityHost + Send + Sync + 'static,
{
    let device = state.registry.create_device(&req.name, &req.blaster).await?;
    Ok(CreateResponse::Created(Json(device)))
}

/// `DELETE /api/devices/{id}`
pub async fn delete<S, T, H>(
    State(state): State<AppState<S, T, H>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    S: SnapshotStore + Send + Sync + 'static,
    T: Transceiver + Send + Sync + 'static,
    H: EntityHost + Send + Sync + 'static,
{
    let device_id = parse_device_id(&id)?;
    state.registry.delete_device(device_id).await?;
    Ok(DeleteResponse::NoContent)
}
