use axum::{extract::Multipart, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

use crate::{
    config::Config,
    database::Repository,
    errors::{AppError, Result},
    models::parse_parent_ref,
    services::{metrics::MetricsService, ItemStore, Upload, UserService},
    storage::BlobStore,
};

pub mod auth;
pub mod dashboard;
pub mod extract;
pub mod favorites;
pub mod files;
pub mod folders;
pub mod health;
pub mod images;
pub mod links;
pub mod metrics;
pub mod notes;
pub mod pdfs;

pub use extract::{ApiJson, ApiPath, ApiQuery};

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn Repository>,
    pub blobs: Arc<dyn BlobStore>,
    pub config: Config,
    pub metrics: Arc<MetricsService>,
    pub prometheus: Option<PrometheusHandle>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(repository: Arc<dyn Repository>, blobs: Arc<dyn BlobStore>, config: Config) -> Self {
        Self {
            repository,
            blobs,
            config,
            metrics: Arc::new(MetricsService::new()),
            prometheus: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    pub fn items(&self) -> ItemStore {
        ItemStore::new(self.repository.clone(), self.blobs.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.repository.clone(), &self.config)
    }
}

pub fn ok<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "data": data
    }))
}

pub fn ok_with_message<T: Serialize>(message: &str, data: T) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": message,
        "data": data
    }))
}

/// Reads a multipart upload: the binary from `file_field` plus the optional
/// `name` and `folderId` text fields.
pub async fn read_upload(mut multipart: Multipart, file_field: &str, max_size: usize) -> Result<Upload> {
    let mut upload = Upload {
        name: None,
        original_name: String::new(),
        content_type: None,
        folder_id: None,
        data: Vec::new(),
    };
    let mut has_file = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "name" => {
                upload.name = Some(field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read name: {}", e))
                })?);
            }
            "folderId" => {
                let raw = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read folderId: {}", e))
                })?;
                upload.folder_id = parse_parent_ref(Some(&raw))?;
            }
            name if name == file_field => {
                upload.original_name = field.file_name().unwrap_or("upload").to_string();
                upload.content_type = field.content_type().map(str::to_string);
                upload.data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?
                    .to_vec();
                has_file = true;
            }
            _ => {
                // Skip unknown fields
            }
        }
    }

    if !has_file {
        return Err(AppError::InvalidInput(format!(
            "No file uploaded. Expected field '{}'",
            file_field
        )));
    }

    if upload.data.len() > max_size {
        return Err(AppError::InvalidInput(format!(
            "File size exceeds maximum allowed size of {} bytes",
            max_size
        )));
    }

    Ok(upload)
}
