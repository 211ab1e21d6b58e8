use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use iam_core::IamError;
use thiserror::Error;

/// Errors that can occur handling a decision-endpoint request. Only the
/// `Bind` and `Unauthenticated` variants are ever user-visible, per the
/// spec's error propagation policy — every other [`IamError`] variant is a
/// component-internal retriable failure that never reaches this layer.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("malformed request: {0}")]
    Bind(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<IamError> for ServerError {
    fn from(value: IamError) -> Self {
        match value {
            IamError::Bind(msg) => Self::Bind(msg),
            IamError::Unauthenticated(msg) => Self::Unauthenticated(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Bind(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
