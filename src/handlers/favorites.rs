use axum::{extract::State, response::Json};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    errors::Result,
    handlers::{ok, ok_with_message, ApiPath, AppState},
    middleware::AuthenticatedUser,
    services::FavoriteService,
};

fn favorites(state: &AppState) -> FavoriteService {
    FavoriteService::new(state.repository.clone())
}

pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>> {
    Ok(ok(favorites(&state).list(user.id).await?))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(item_id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    let item = favorites(&state).add(item_id, user.id).await?;
    Ok(ok_with_message("Added to favorites", item))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(item_id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    let item = favorites(&state).remove(item_id, user.id).await?;
    Ok(ok_with_message("Removed from favorites", item))
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(item_id): ApiPath<Uuid>,
) -> Result<Json<Value>> {
    let item = favorites(&state).toggle(item_id, user.id).await?;
    let message = if item.is_favorite {
        "Added to favorites"
    } else {
        "Removed from favorites"
    };
    Ok(ok_with_message(message, item))
}
