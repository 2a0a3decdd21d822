use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::Value;

use crate::{
    errors::Result,
    handlers::{ok, ok_with_message, ApiJson, AppState},
    middleware::AuthenticatedUser,
    models::{ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest},
};

pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let response = state.users().register(request).await?;
    Ok((
        StatusCode::CREATED,
        ok_with_message("User registered successfully", response),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<Value>> {
    let response = state.users().login(request).await?;
    Ok(ok_with_message("Login successful", response))
}

pub async fn profile(State(state): State<AppState>, user: AuthenticatedUser) -> Result<Json<Value>> {
    Ok(ok(state.users().profile(user.id).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<Value>> {
    let updated = state.users().update_profile(user.id, request).await?;
    Ok(ok_with_message("Profile updated successfully", updated))
}

pub async fn change_password(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<Json<Value>> {
    state.users().change_password(user.id, request).await?;
    Ok(ok_with_message("Password changed successfully", Value::Null))
}

pub async fn delete_account(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>> {
    state.users().delete_account(user.id).await?;
    Ok(ok_with_message("Account deleted successfully", Value::Null))
}
