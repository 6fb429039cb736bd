//! JSON REST handlers for commands: add, delete, send, and learn.

use std::time::Duration;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use irhub_app::ports::{EntityHost, SnapshotStore, Transceiver};
use irhub_domain::error::IrHubError;
use irhub_domain::remote::Command;

use crate::error::ApiError;
use crate::state::AppState;

use super::parse_device_id;

/// Request body for adding a command manually.
#[derive(Deserialize)]
pub struct AddCommandRequest {
    pub name: String,
    pub code_base64: String,
}

/// Request body for learning a command.
#[derive(Deserialize)]
pub struct LearnRequest {
    pub name: String,
    /// Overrides the configured learn deadline when present.
    pub timeout_secs: Option<u64>,
}

/// How a learn request ended. Timeout and cancellation are outcomes here,
/// not HTTP errors.
#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LearnOutcome {
    Learned { command: Command },
    Timeout,
    Cancelled,
}

impl IntoResponse for LearnOutcome {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Learned { .. } => StatusCode::CREATED,
            Self::Timeout | Self::Cancelled => StatusCode::OK,
        };
        (status, Json(self)).into_response()
    }
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Command>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the add endpoint.
pub enum AddResponse {
    Created(Json<Command>),
}

impl IntoResponse for AddResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete and send endpoints.
pub enum NoContentResponse {
    NoContent,
}

impl IntoResponse for NoContentResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/devices/{id}/commands`
pub async fn list<S, T, H>(
    State(state): State<AppState<S, T, H>>,
    Path(id): Path<String>,
) -> Result<ListResponse, ApiError>
where
    S: SnapshotStore + Send + Sync + 'static,
    T: Transceiver + Send + Sync + 'static,
    H: EntityHost + Send + Sync + 'static,
{
    let device_id = parse_device_id(&id)?;
    let commands = state.registry.list_commands(device_id).await?;
    Ok(ListResponse::Ok(Json(commands)))
}

/// `POST /api/devices/{id}/commands`
pub async fn add<S, T, H>(
    State(state): State<AppState<S, T, H>>,
    Path(id): Path<String>,
    Json(req): Json<AddCommandRequest>,
) -> Result<AddResponse, ApiError>
where
    S: SnapshotStore + Send + Sync + 'static,
    T: Transceiver + Send + Sync + 'static,
    H: EntityHost + Send + Sync + 'static,
{
    let device_id = parse_device_id(&id)?;
    let command = state
        .command_service
        .add_command(device_id, &req.name, &req.code_base64)
        .await?;
    Ok(AddResponse::Created(Json(command)))
}

/// `POST /api/devices/{id}/commands/learn`
///
/// Runs the learn interaction to completion and reports its outcome.
pub async fn learn<S, T, H>(
    State(state): State<AppState<S, T, H>>,
    Path(id): Path<String>,
    Json(req): Json<LearnRequest>,
) -> Result<LearnOutcome, ApiError>
where
    S: SnapshotStore + Send + Sync + 'static,
    T: Transceiver + Send + Sync + 'static,
    H: EntityHost + Send + Sync + 'static,
{
    let device_id = parse_device_id(&id)?;
    let timeout = req
        .timeout_secs
        .map_or(state.learn_timeout, Duration::from_secs);
    match state
        .command_service
        .learn_command(device_id, &req.name, timeout)
        .await
    {
        Ok(command) => Ok(LearnOutcome::Learned { command }),
        Err(IrHubError::LearnTimeout) => Ok(LearnOutcome::Timeout),
        Err(IrHubError::LearnCancelled) => Ok(LearnOutcome::Cancelled),
        Err(err) => Err(err.into()),
    }
}

/// `DELETE /api/devices/{id}/commands/{name}`
pub async fn delete<S, T, H>(
    State(state): State<AppState<S, T, H>>,
    Path((id, name)): Path<(String, String)>,
) -> Result<NoContentResponse, ApiError>
where
    S: SnapshotStore + Send + Sync + 'static,
    T: Transceiver + Send + Sync + 'static,
    H: EntityHost + Send + Sync + 'static,
{
    let device_id = parse_device_id(&id)?;
    state
        .command_service
        .delete_command(device_id, &name)
        .await?;
    Ok(NoContentResponse::NoContent)
}

/// `POST /api/devices/{id}/commands/{name}/send`
pub async fn send<S, T, H>(
    State(state): State<AppState<S, T, H>>,
    Path((id, name)): Path<(String, String)>,
) -> Result<NoContentResponse, ApiError>
where
    S: SnapshotStore + Send + Sync + 'static,
    T: Transceiver + Send + Sync + 'static,
    H: EntityHost + Send + Sync + 'static,
{
    let device_id = parse_device_id(&id)?;
    state.command_service.send_command(device_id, &name).await?;
    Ok(NoContentResponse::NoContent)
}
