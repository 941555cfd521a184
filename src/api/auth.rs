use axum::{
    extract::{Request, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::form::read_form;
use crate::auth::AuthError;
use crate::error::ApiError;
use crate::state::AppState;
use crate::user_models::{LoginResponse, RegisterResponse, User};
use crate::user_storage::UserStoreError;

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

/// Username and password from a JSON, urlencoded or multipart body.
async fn required_credentials(
    state: &AppState,
    request: Request,
) -> Result<(String, String), ApiError> {
    let form = read_form(state, request).await?;

    match (form.text("username"), form.text("password")) {
        (Some(username), Some(password)) => Ok((username.trim().to_string(), password)),
        _ => Err(ApiError::validation("Username and password are required")),
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let (username, password) = required_credentials(&state, request).await?;

    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(ApiError::validation(format!(
            "Username must be at least {} characters long",
            MIN_USERNAME_LEN
        )));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }

    // Cheap early exit; create_user repeats the check under the lock.
    if state.users.get_user_by_username(&username).await.is_some() {
        return Err(UserStoreError::DuplicateUsername.into());
    }

    let password_hash = state.credentials.hash_password(&password).await?;
    let user = state
        .users
        .create_user(User::new(username, password_hash))
        .await?;

    tracing::info!(user = %user.username, "Registered user");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created".to_string(),
            user: user.public(),
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<LoginResponse>, ApiError> {
    let (username, password) = required_credentials(&state, request)
        .await
        .map_err(|_| AuthError::InvalidCredentials)?;

    let Some(user) = state.users.get_user_by_username(&username).await else {
        state.credentials.verify_unknown_user(&password).await;
        tracing::info!(user = %username, "Rejected login");
        return Err(AuthError::InvalidCredentials.into());
    };

    if !state
        .credentials
        .verify_password(&password, &user.password_hash)
        .await
    {
        tracing::info!(user = %username, "Rejected login");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.credentials.issue_token(&user)?;
    tracing::info!(user = %user.username, "Issued session token");

    Ok(Json(LoginResponse {
        token,
        user: user.public(),
    }))
}
