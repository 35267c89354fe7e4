use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The user this token was issued to.
    pub sub: Uuid,
    /// The user's password version at issue time. Compared against the
    /// authoritative stored value on every request; a mismatch means the
    /// password changed after this token was issued. Tokens from before the
    /// claim existed carry no value and default to 0.
    #[serde(default)]
    pub password_version: i32,
    /// Issued-at (Unix timestamp, seconds).
    pub iat: i64,
    /// Expiry (Unix timestamp, seconds).
    pub exp: i64,
}

/// Issues a signed access token for a user.
pub fn issue(
    secret: &[u8],
    user_id: Uuid,
    password_version: i32,
    ttl_minutes: i64,
) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        password_version,
        iat: now.timestamp(),
        exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign access token: {}", e)))
}

/// Decodes and validates an access token, returning its claims.
pub fn verify(secret: &[u8], token: &str) -> Result<Claims> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::Authentication("Invalid or expired token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-test-secret-test-secret!";

    #[test]
    fn issued_token_round_trips() {
        let user = Uuid::new_v4();
        let token = issue(SECRET, user, 4, 60).unwrap();
        let claims = verify(SECRET, &token).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.password_version, 4);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue(SECRET, Uuid::new_v4(), 0, 60).unwrap();
        let err = verify(b"another-secret-another-secret-pad!", &token).unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(
            verify(SECRET, "not.a.token"),
            Err(AppError::Authentication(_))
        ));
    }

    #[test]
    fn missing_password_version_claim_defaults_to_zero() {
        // Tokens minted before the claim existed must still decode.
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "sub": Uuid::new_v4(),
            "iat": 1_700_000_000,
            "exp": 4_000_000_000u64,
        }))
        .unwrap();
        assert_eq!(claims.password_version, 0);
    }
}
