use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::metrics::MetricsService;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    QuotaExceeded(String),

    #[error("Cannot delete folder with contents. Please delete all files and subfolders first.")]
    NonEmptyFolder,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Upload failed: {0}")]
    UpstreamUpload(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{} not found", what))
    }

    pub fn storage_limit_exceeded() -> Self {
        AppError::QuotaExceeded("Storage limit exceeded".to_string())
    }

    /// Short label used for the `errors_total` metric.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::QuotaExceeded(_) => "quota_exceeded",
            AppError::NonEmptyFolder => "non_empty_folder",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::UpstreamUpload(_) => "upstream_upload",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Conflict(_) => "conflict",
            AppError::Database(_) => "database",
            AppError::Io(_) => "io",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        MetricsService::new().record_error(self.kind());

        let (status, message) = match self {
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::QuotaExceeded(ref msg) => (StatusCode::PAYMENT_REQUIRED, msg.clone()),
            AppError::NonEmptyFolder => (StatusCode::CONFLICT, self.to_string()),
            AppError::InvalidInput(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::UpstreamUpload(ref msg) => {
                tracing::error!("Upload collaborator error: {}", msg);
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Io(ref e) => {
                tracing::error!("IO error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "IO error".to_string())
            }
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "status": "ERROR",
            "message": message
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(inner) => {
                AppError::InvalidInput(inner.body_text())
            }
            // Routing bug: the handler asked for params its route never declared.
            other => AppError::Internal(anyhow::anyhow!(other.body_text())),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
