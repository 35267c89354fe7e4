use deadpool_postgres::Pool;
use crate::auth::blacklist::TokenBlacklist;
use crate::auth::password_version::PasswordVersionCache;
use crate::config::Config;
use crate::error::Result;

/// The application's state.
///
/// The blacklist and password-version cache are owned here rather than
/// living as module-level singletons, so tests and multi-instance
/// deployments control their lifecycle and a shared external cache can
/// replace them behind the same interface.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The application's configuration.
    pub config: Config,
    /// Revoked access tokens (explicit logouts).
    pub token_blacklist: TokenBlacklist,
    /// Short-TTL cache of each user's password version.
    pub password_versions: PasswordVersionCache,
}

impl AppState {
    /// Creates a new `AppState`.
    pub fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("PostgreSQL pool initialized with deadpool-postgres");

        let token_blacklist = TokenBlacklist::new();
        tracing::info!("Token blacklist initialized");

        let password_versions = PasswordVersionCache::new();
        tracing::info!("Password-version cache initialized");

        Ok(AppState {
            db,
            config: config.clone(),
            token_blacklist,
            password_versions,
        })
    }
}
