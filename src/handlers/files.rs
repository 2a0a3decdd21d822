use axum::{extract::State, response::Json};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    errors::Result,
    handlers::{ok, ok_with_message, ApiPath, ApiQuery, AppState},
    middleware::AuthenticatedUser,
    models::FileListQuery,
    services::FileService,
};

/// Query: `type`, `folderId` (`root` for unfiled), `isFavorite`.
pub async fn list_files(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<FileListQuery>,
) -> Result<Json<Value>> {
    Ok(ok(FileService::new(state.items()).list(user.id, &query).await?))
}

pub async fn get_file(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    Ok(ok(FileService::new(state.items()).get(id, user.id).await?))
}

pub async fn delete_file(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    FileService::new(state.items()).delete(id, user.id).await?;
    Ok(ok_with_message("File deleted successfully", Value::Null))
}
