use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Represents a user in the system.
#[derive(Clone, Debug)]
pub struct User {
    /// The unique identifier for the user.
    pub id: Uuid,
    /// The user's email address.
    pub email: String,
    /// The user's display name.
    pub display_name: String,
    /// The user's hashed password.
    pub password_hash: String,
    /// Incremented on every password change. Embedded in access tokens so a
    /// password change invalidates all previously issued tokens.
    pub password_version: i32,
    /// The user's preferred timezone.
    pub timezone: Option<String>,
    /// The user's home currency code.
    pub home_currency: Option<String>,
    /// The user's preferred distance unit ("km" or "mi").
    pub distance_unit: Option<String>,
    /// API key for the weather integration, if configured.
    pub weather_api_key: Option<String>,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Whether the user is active.
    pub is_active: bool,
}
