use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::Result,
    middleware_layer::auth::AuthContext,
    models::user::User,
    services::auth as auth_service,
    state::AppState,
    validation::auth::*,
};

/// The request payload for user registration.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

/// The request payload for user login.
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The request payload for changing a user's password.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// The user fields returned by authentication endpoints.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
        }
    }
}

/// The response payload for authentication-related requests.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

/// Handles user registration.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response> {
    tracing::info!("Register attempt for {}", payload.email);
    validate_email(&payload.email)?;
    validate_display_name(&payload.display_name)?;
    validate_password(&payload.password)?;

    let (user, token) = auth_service::register(
        &state,
        &payload.email,
        &payload.display_name,
        &payload.password,
    )
    .await?;

    let response = AuthResponse {
        success: true,
        message: "Registration successful. Welcome!".to_string(),
        token: Some(token),
        user: Some(user.into()),
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Handles user login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    tracing::info!("Login attempt for {}", payload.email);
    validate_email(&payload.email)?;

    let (user, token) = auth_service::login(&state, &payload.email, &payload.password).await?;

    let response = AuthResponse {
        success: true,
        message: "Login successful".to_string(),
        token: Some(token),
        user: Some(user.into()),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles user logout by blacklisting the presented token for the rest of
/// its lifetime. Tokens already past expiry need no blacklist entry.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Response> {
    tracing::info!("Logout for user {}", auth.user_id);

    let claims = crate::auth::token::verify(&state.config.jwt_secret, &auth.token)?;
    let remaining = claims.exp - Utc::now().timestamp();
    if remaining > 0 {
        state
            .token_blacklist
            .blacklist(&auth.token, Duration::seconds(remaining))
            .await;
    }

    let response = AuthResponse {
        success: true,
        message: "Logout successful".to_string(),
        token: None,
        user: None,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles changing a user's password. Returns a fresh token minted against
/// the new password version; every older token is now stale.
#[axum::debug_handler]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Response> {
    tracing::info!("Change password for user {}", auth.user_id);

    validate_password(&payload.new_password)?;

    let token = auth_service::change_password(
        &state,
        auth.user_id,
        &payload.current_password,
        &payload.new_password,
    )
    .await?;

    let response = AuthResponse {
        success: true,
        message: "Password changed successfully".to_string(),
        token: Some(token),
        user: None,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
