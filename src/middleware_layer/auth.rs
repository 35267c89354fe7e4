use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};

use crate::{
    auth::token,
    error::{AppError, Result},
    repositories::user as user_repo,
    state::AppState,
};

/// What authenticated handlers get out of the request extensions.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: uuid::Uuid,
    /// The raw bearer token, kept so logout can blacklist it.
    pub token: String,
}

/// Pulls the bearer token out of the `Authorization` header.
fn extract_bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// A middleware that requires a valid, non-revoked access token.
///
/// Order matters: signature and expiry first, then the blacklist, then the
/// password version. The version check hits the cache and only falls back to
/// one database query on a miss, so most requests cost no round-trip.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    let token = extract_bearer_token(&request)
        .ok_or_else(|| {
            tracing::debug!("Missing or malformed Authorization header");
            AppError::Authentication("Missing bearer token".to_string())
        })?
        .to_string();

    let claims = token::verify(&state.config.jwt_secret, &token)?;

    if state.token_blacklist.is_blacklisted(&token).await {
        tracing::debug!("Rejected blacklisted token for user {}", claims.sub);
        return Err(AppError::Authentication("Invalid or expired token".to_string()));
    }

    let current_version = match state.password_versions.get(claims.sub).await {
        Some(version) => version,
        None => {
            let client = state.db.get().await?;
            let version = user_repo::find_password_version(&client, &claims.sub)
                .await?
                .ok_or_else(|| {
                    AppError::SessionInvalidated(
                        "Session invalidated, please log in again".to_string(),
                    )
                })?;
            state.password_versions.set(claims.sub, version).await;
            version
        }
    };

    if claims.password_version != current_version {
        tracing::info!(
            "Rejected stale token for user {} (token version {}, current {})",
            claims.sub,
            claims.password_version,
            current_version
        );
        return Err(AppError::SessionInvalidated(
            "Session invalidated, please log in again".to_string(),
        ));
    }

    request.extensions_mut().insert(AuthContext {
        user_id: claims.sub,
        token,
    });

    Ok(next.run(request).await)
}
