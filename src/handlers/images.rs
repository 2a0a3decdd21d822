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
    services::ImageService,
};

fn images(state: &AppState) -> ImageService {
    ImageService::new(state.items())
}

pub async fn list_images(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<ItemListQuery>,
) -> Result<Json<Value>> {
    let folder = FolderScope::parse(query.folder_id.as_deref())?;
    Ok(ok(images(&state).list(user.id, folder).await?))
}

pub async fn get_image(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    Ok(ok(images(&state).get(id, user.id).await?))
}

/// Multipart fields: `image` (file), `name`, `folderId`.
pub async fn upload_image(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>)> {
    let upload = read_upload(multipart, "image", state.config.max_file_size).await?;
    let image = images(&state).upload(user.id, upload).await?;
    Ok((StatusCode::CREATED, ok_with_message("Image uploaded successfully", image)))
}

pub async fn delete_image(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    images(&state).delete(id, user.id).await?;
    Ok(ok_with_message("Image deleted successfully", Value::Null))
}
