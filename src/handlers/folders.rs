use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    errors::Result,
    handlers::{ok, ok_with_message, ApiJson, ApiPath, ApiQuery, AppState},
    middleware::AuthenticatedUser,
    models::{CreateFolderRequest, FolderListQuery, FolderScope, RenameFolderRequest},
    services::FolderService,
};

fn folders(state: &AppState) -> FolderService {
    FolderService::new(state.repository.clone())
}

pub async fn list_folders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<FolderListQuery>,
) -> Result<Json<Value>> {
    let parent = FolderScope::parse(query.parent_id.as_deref())?;
    Ok(ok(folders(&state).list(user.id, parent).await?))
}

pub async fn get_folder(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    Ok(ok(folders(&state).get(id, user.id).await?))
}

pub async fn create_folder(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(request): ApiJson<CreateFolderRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let folder = folders(&state).create(user.id, request).await?;
    Ok((StatusCode::CREATED, ok_with_message("Folder created successfully", folder)))
}

pub async fn rename_folder(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<RenameFolderRequest>,
) -> Result<Json<Value>> {
    let folder = folders(&state).rename(id, user.id, request.name.as_deref()).await?;
    Ok(ok_with_message("Folder updated successfully", folder))
}

pub async fn delete_folder(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    folders(&state).delete(id, user.id).await?;
    Ok(ok_with_message("Folder deleted successfully", Value::Null))
}

pub async fn folder_files(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    Ok(ok(folders(&state).files(id, user.id).await?))
}
