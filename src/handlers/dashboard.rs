use axum::{extract::State, response::Json};
use serde_json::Value;

use crate::{
    errors::Result,
    handlers::{ok, ApiQuery, AppState},
    middleware::AuthenticatedUser,
    models::{RecentQuery, SearchQuery},
    services::DashboardService,
};

fn dashboard(state: &AppState) -> DashboardService {
    DashboardService::new(state.repository.clone(), state.config.recent_limit_max)
}

pub async fn summary(State(state): State<AppState>, user: AuthenticatedUser) -> Result<Json<Value>> {
    Ok(ok(dashboard(&state).summary(user.id).await?))
}

pub async fn recent(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<RecentQuery>,
) -> Result<Json<Value>> {
    Ok(ok(dashboard(&state).recent(user.id, query.limit).await?))
}

pub async fn search(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Value>> {
    Ok(ok(dashboard(&state).search(user.id, query.q.as_deref()).await?))
}
