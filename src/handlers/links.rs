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
    models::{CreateLinkRequest, FolderScope, ItemListQuery},
    services::LinkService,
};

pub async fn list_links(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<ItemListQuery>,
) -> Result<Json<Value>> {
    let folder = FolderScope::parse(query.folder_id.as_deref())?;
    Ok(ok(LinkService::new(state.items()).list(user.id, folder).await?))
}

pub async fn create_link(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(request): ApiJson<CreateLinkRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let link = LinkService::new(state.items()).create(user.id, request).await?;
    Ok((StatusCode::CREATED, ok_with_message("Link saved successfully", link)))
}

pub async fn delete_link(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    LinkService::new(state.items()).delete(id, user.id).await?;
    Ok(ok_with_message("Link deleted successfully", Value::Null))
}
