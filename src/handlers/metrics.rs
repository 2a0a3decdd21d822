use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{
    errors::{AppError, Result},
    handlers::AppState,
};

pub async fn metrics_handler(State(state): State<AppState>) -> Result<Response> {
    let handle = state
        .prometheus
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Metrics recorder is not installed".to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response())
}
