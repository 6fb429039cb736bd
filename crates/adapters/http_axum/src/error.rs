//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use irhub_domain::error::IrHubError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`IrHubError`] to an HTTP response with appropriate status code.
///
/// `LearnTimeout` and `LearnCancelled` are not errors on the learn endpoint
/// (the handler turns them into outcome bodies); they only reach this
/// mapping when a learn signal leaks out of another operation, where 409 is
/// the closest fit.
pub struct ApiError(IrHubError);

impl From<IrHubError> for ApiError {
    fn from(err: IrHubError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            IrHubError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            IrHubError::InvalidPayload(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            IrHubError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            IrHubError::Conflict(err) => (StatusCode::CONFLICT, err.to_string()),
            IrHubError::Busy(err) => (StatusCode::CONFLICT, err.to_string()),
            IrHubError::LearnTimeout | IrHubError::LearnCancelled => {
                (StatusCode::CONFLICT, self.0.to_string())
            }
            IrHubError::Transmit(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
            IrHubError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
