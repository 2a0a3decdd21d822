use axum::{extract::State, response::Json};
use serde_json::json;

use crate::{errors::Result, handlers::AppState};

pub async fn health() -> Result<Json<serde_json::Value>> {
    Ok(Json(json!({
        "status": "OK",
        "message": "Server is running",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

pub async fn detailed(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let store_status = match state.repository.ping().await {
        Ok(()) => "healthy",
        Err(e) => {
            tracing::warn!("Health check could not reach the store: {}", e);
            "unhealthy"
        }
    };

    let store_kind = if state.config.uses_memory_store() {
        "memory"
    } else {
        "postgres"
    };

    Ok(Json(json!({
        "status": if store_status == "healthy" { "OK" } else { "DEGRADED" },
        "checks": {
            "database": { "status": store_status, "kind": store_kind }
        },
        "uptimeSeconds": state.started_at.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
        "apiVersion": state.config.api_version,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
