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
    models::{CreateNoteRequest, FolderScope, ItemListQuery, UpdateNoteRequest},
    services::NoteService,
};

fn notes(state: &AppState) -> NoteService {
    NoteService::new(state.items())
}

pub async fn list_notes(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<ItemListQuery>,
) -> Result<Json<Value>> {
    let folder = FolderScope::parse(query.folder_id.as_deref())?;
    Ok(ok(notes(&state).list(user.id, folder).await?))
}

pub async fn get_note(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    Ok(ok(notes(&state).get(id, user.id).await?))
}

pub async fn create_note(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(request): ApiJson<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let note = notes(&state).create(user.id, request).await?;
    Ok((StatusCode::CREATED, ok_with_message("Note created successfully", note)))
}

pub async fn update_note(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateNoteRequest>,
) -> Result<Json<Value>> {
    let note = notes(&state).update(id, user.id, request).await?;
    Ok(ok_with_message("Note updated successfully", note))
}

pub async fn delete_note(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    notes(&state).delete(id, user.id).await?;
    Ok(ok_with_message("Note deleted successfully", Value::Null))
}
