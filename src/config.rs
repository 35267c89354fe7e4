use std::env;
use anyhow::{Context, Result};
use zeroize::Zeroizing;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The secret used to sign and verify access tokens.
    pub jwt_secret: Zeroizing<Vec<u8>>,
    /// The secret used to sign backup documents. Falls back to the token
    /// secret when not configured, so backups signed by older deployments
    /// keep verifying.
    pub backup_signing_secret: Zeroizing<Vec<u8>>,
    /// The lifetime of an access token in minutes.
    pub access_token_ttl_minutes: i64,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET")
            .context("JWT_SECRET must be set (generate with: openssl rand -hex 32)")?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters");
        }

        let backup_signing_secret = match env::var("BACKUP_SIGNING_SECRET") {
            Ok(secret) => {
                if secret.len() < 32 {
                    anyhow::bail!("BACKUP_SIGNING_SECRET must be at least 32 characters");
                }
                Zeroizing::new(secret.into_bytes())
            }
            Err(_) => {
                tracing::warn!(
                    "BACKUP_SIGNING_SECRET not set, falling back to JWT_SECRET for backup signing"
                );
                Zeroizing::new(jwt_secret.clone().into_bytes())
            }
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            jwt_secret: Zeroizing::new(jwt_secret.into_bytes()),
            backup_signing_secret,
            access_token_ttl_minutes: env::var("ACCESS_TOKEN_TTL_MINUTES")
                .unwrap_or_else(|_| "1440".to_string())
                .parse()
                .context("Invalid ACCESS_TOKEN_TTL_MINUTES")?,
        })
    }
}
