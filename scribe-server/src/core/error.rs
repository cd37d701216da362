use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::persistence::StoreError;

/// Main error type for Scribe request handling
#[derive(Debug, Error)]
pub enum ScribeError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid entity: {}", .0.join(", "))]
    Validation(Vec<&'static str>),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ScribeError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Implement IntoResponse for Axum integration
impl IntoResponse for ScribeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = json!({
            "error": self.to_string(),
            "code": status.as_u16(),
        });
        if let Self::Validation(violations) = &self {
            body["violations"] = json!(violations);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for Scribe request handling
pub type Result<T> = std::result::Result<T, ScribeError>;
