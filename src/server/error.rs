// HTTP error responses
//
// Every error leaves the API as `{"detail": "<message>"}`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::errors::GenerationError;
use crate::store::StoreError;

#[derive(Debug)]
pub enum ApiError {
    /// Every provider failed (503)
    Unavailable(String),
    /// The whole-request deadline expired (504)
    Timeout(String),
    NotFound(String),
    Conflict(String),
    /// Body parsed but failed validation, or did not parse (422)
    Unprocessable(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::Unavailable(d)
            | Self::Timeout(d)
            | Self::NotFound(d)
            | Self::Conflict(d)
            | Self::Unprocessable(d)
            | Self::Internal(d) => d,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        // Individual provider failures stay in the logs
        Self::Unavailable(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(format!("{} not found", what)),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                Self::Internal("Database error".to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Unprocessable(rejection.body_text())
    }
}
