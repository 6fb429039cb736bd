//! JSON REST handlers for the setup/management wizard.
//!
//! The wizard renders each step as a [`StepView`]; clients POST one
//! [`WizardInput`] at a time and receive the next view. A flow that has
//! finished restarts at the menu on the next submission.

use axum::Json;
use axum::extract::State;

use irhub_app::ports::{EntityHost, SnapshotStore, Transceiver};
use irhub_app::wizard::{StepView, WizardInput};

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/wizard` — render the current step.
pub async fn view<S, T, H>(
    State(state): State<AppState<S, T, H>>,
) -> Result<Json<StepView>, ApiError>
where
    S: SnapshotStore + Send + Sync + 'static,
    T: Transceiver + Send + Sync + 'static,
    H: EntityHost + Send + Sync + 'static,
{
    Ok(Json(state.wizard.view().await?))
}

/// `POST /api/wizard` — submit one input, get the next step.
pub async fn submit<S, T, H>(
    State(state): State<AppState<S, T, H>>,
    Json(input): Json<WizardInput>,
) -> Result<Json<StepView>, ApiError>
where
    S: SnapshotStore + Send + Sync + 'static,
    T: Transceiver + Send + Sync + 'static,
    H: EntityHost + Send + Sync + 'static,
{
    Ok(Json(state.wizard.handle_or_restart(input).await?))
}

/// `POST /api/wizard/reset` — abandon the flow, back to the menu.
pub async fn reset<S, T, H>(
    State(state): State<AppState<S, T, H>>,
) -> Result<Json<StepView>, ApiError>
where
    S: SnapshotStore + Send + Sync + 'static,
    T: Transceiver + Send + Sync + 'static,
    H: EntityHost + Send + Sync + 'static,
{
    state.wizard.reset();
    Ok(Json(state.wizard.view().await?))
}
