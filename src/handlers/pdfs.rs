use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    errors::Result,
    handlers::{ok, ok_with_message, read_upload, ApiPath, ApiQuery, AppState},
    middleware::AuthenticatedUser,
    models::{FolderScope, ItemListQuery},
    services::PdfService,
};

fn pdfs(state: &AppState) -> PdfService {
    PdfService::new(state.items())
}

pub async fn list_pdfs(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<ItemListQuery>,
) -> Result<Json<Value>> {
    let folder = FolderScope::parse(query.folder_id.as_deref())?;
    Ok(ok(pdfs(&state).list(user.id, folder).await?))
}

pub async fn get_pdf(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    Ok(ok(pdfs(&state).get(id, user.id).await?))
}

/// Multipart fields: `pdf` (file), `name`, `folderId`.
pub async fn upload_pdf(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>)> {
    let upload = read_upload(multipart, "pdf", state.config.max_file_size).await?;
    let pdf = pdfs(&state).upload(user.id, upload).await?;
    Ok((StatusCode::CREATED, ok_with_message("PDF uploaded successfully", pdf)))
}

pub async fn delete_pdf(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    pdfs(&state).delete(id, user.id).await?;
    Ok(ok_with_message("PDF deleted successfully", Value::Null))
}
