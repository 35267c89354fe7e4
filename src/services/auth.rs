use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder,
};
use rand::{rngs::OsRng, RngCore};
use uuid::Uuid;
use zeroize::Zeroize;

use crate::auth::token;
use crate::error::{AppError, Result};
use crate::models::user::User;
use crate::repositories::user as user_repo;
use crate::state::AppState;

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 6;

/// Hashes a password using Argon2id.
fn hash_password(password: &str) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();

    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);

    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Internal(format!("Salt encoding error: {}", e)))?;

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        ParamsBuilder::new()
            .m_cost(ARGON2_MEMORY_MB * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .build()
            .map_err(|e| AppError::Internal(format!("Argon2 params: {}", e)))?,
    );

    let password_hash = argon2
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AppError::Internal(format!("Argon2 hash error: {}", e)))?
        .to_string();

    password_bytes.zeroize();
    tracing::debug!("Password hashed successfully with Argon2");
    Ok(password_hash)
}

/// Verifies a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Hash parse error: {}", e)))?;
    let argon2 = Argon2::default();
    let result = argon2.verify_password(&password_bytes, &parsed_hash).is_ok();

    password_bytes.zeroize();
    tracing::debug!("Password verification completed");
    Ok(result)
}

/// Registers a new user and returns it with a fresh access token.
pub async fn register(
    state: &AppState,
    email: &str,
    display_name: &str,
    password: &str,
) -> Result<(User, String)> {
    let client = state.db.get().await?;

    if user_repo::find_by_email(&client, email).await?.is_some() {
        return Err(AppError::Validation("Email is already registered".to_string()));
    }

    let password_hash = hash_password(password)?;
    let user = user_repo::create_user(&client, Uuid::new_v4(), email, display_name, &password_hash)
        .await?;

    let access_token = token::issue(
        &state.config.jwt_secret,
        user.id,
        user.password_version,
        state.config.access_token_ttl_minutes,
    )?;

    tracing::info!("Registered user {}", user.id);
    Ok((user, access_token))
}

/// Authenticates a user by email and password, returning an access token.
///
/// Unknown email and wrong password produce the same error so the endpoint
/// does not leak which accounts exist.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<(User, String)> {
    let client = state.db.get().await?;

    let user = user_repo::find_by_email(&client, email)
        .await?
        .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

    if !verify_password(password, &user.password_hash)? {
        tracing::warn!("Failed login attempt for user {}", user.id);
        return Err(AppError::Authentication("Invalid email or password".to_string()));
    }

    state
        .password_versions
        .set(user.id, user.password_version)
        .await;

    let access_token = token::issue(
        &state.config.jwt_secret,
        user.id,
        user.password_version,
        state.config.access_token_ttl_minutes,
    )?;

    tracing::info!("User {} logged in", user.id);
    Ok((user, access_token))
}

/// Changes a user's password and bumps the password version, invalidating
/// every token minted before the change.
///
/// The cache entry is removed synchronously so stale versions cannot be
/// served for up to a TTL after the change.
pub async fn change_password(
    state: &AppState,
    user_id: Uuid,
    current_password: &str,
    new_password: &str,
) -> Result<String> {
    let client = state.db.get().await?;

    let user = user_repo::find_by_id(&client, &user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or(AppError::NotFound)?;

    if !verify_password(current_password, &user.password_hash)? {
        return Err(AppError::Authentication("Current password is incorrect".to_string()));
    }

    let new_hash = hash_password(new_password)?;
    let new_version = user_repo::update_password(&client, &user_id, &new_hash).await?;

    state.password_versions.invalidate(user_id).await;

    let access_token = token::issue(
        &state.config.jwt_secret,
        user_id,
        new_version,
        state.config.access_token_ttl_minutes,
    )?;

    tracing::info!("Password changed for user {} (version {})", user_id, new_version);
    Ok(access_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
