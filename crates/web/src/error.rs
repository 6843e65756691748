use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use importer::ImporterError;
use serde_json::json;
use std::fmt;
use storage::{dto::athlete::FieldErrors, error::StorageError};

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    Validation(FieldErrors),
    Import(ImporterError),
    BadRequest(String),
    Unauthorized,
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::Import(e) => write!(f, "Import error: {}", e),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::Unauthorized => write!(f, "Unauthorized"),
        }
    }
}

fn storage_response(error: &StorageError) -> (StatusCode, serde_json::Value) {
    match error {
        StorageError::NotFound => (
            StatusCode::NOT_FOUND,
            json!({
                "error": "Resource not found"
            }),
        ),
        StorageError::ConstraintViolation(msg) => (
            StatusCode::CONFLICT,
            json!({
                "error": msg
            }),
        ),
        e => {
            tracing::error!("Storage error: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "An internal error occurred"
                }),
            )
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status_code, body) = match &self {
            Self::Storage(e) => storage_response(e),
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Validation failed",
                    "details": errors
                }),
            ),
            Self::Import(ImporterError::Io(e)) => {
                tracing::error!("Import IO error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "An internal error occurred"
                    }),
                )
            }
            Self::Import(e) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": e.to_string()
                }),
            ),
            Self::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": msg
                }),
            ),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({
                    "error": "Unauthorized"
                }),
            ),
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<FieldErrors> for WebError {
    fn from(error: FieldErrors) -> Self {
        Self::Validation(error)
    }
}

impl From<ImporterError> for WebError {
    fn from(error: ImporterError) -> Self {
        Self::Import(error)
    }
}

pub type WebResult<T> = Result<T, WebError>;
