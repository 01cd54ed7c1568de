//! HTTP error mapping for API handlers.

use crate::AppError;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Wrapper that renders an [`AppError`] as a status code plus `{ "error": ... }`.
#[derive(Debug)]
pub struct HttpError(pub AppError);

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl From<JsonRejection> for HttpError {
    fn from(value: JsonRejection) -> Self {
        Self(AppError::invalid(value.body_text()))
    }
}

impl From<QueryRejection> for HttpError {
    fn from(value: QueryRejection) -> Self {
        Self(AppError::invalid(value.body_text()))
    }
}

impl HttpError {
    /// Status code and client-facing message for this error.
    ///
    /// Storage failures are logged here and reported with a generic message.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match &self.0 {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            AppError::Conflict(message) => (StatusCode::CONFLICT, message.clone()),
            AppError::Backend(message) => {
                tracing::error!("Storage error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error".to_string(),
                )
            }
            other => {
                tracing::error!("Internal error: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}
