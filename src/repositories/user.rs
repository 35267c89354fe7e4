use deadpool_postgres::GenericClient;
use tokio_postgres::Row;
use uuid::Uuid;
use crate::{
    error::Result,
    models::user::User,
};

const USER_COLUMNS: &str = "id, email, display_name, password_hash, password_version, \
     timezone, home_currency, distance_unit, weather_api_key, \
     created_at, updated_at, is_active";

/// Maps a `tokio_postgres::Row` to a `User`.
fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        display_name: row.try_get("display_name")?,
        password_hash: row.try_get("password_hash")?,
        password_version: row.try_get("password_version")?,
        timezone: row.try_get("timezone")?,
        home_currency: row.try_get("home_currency")?,
        distance_unit: row.try_get("distance_unit")?,
        weather_api_key: row.try_get("weather_api_key")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        is_active: row.try_get("is_active")?,
    })
}

/// Creates a new user.
pub async fn create_user(
    client: &impl GenericClient,
    id: Uuid,
    email: &str,
    display_name: &str,
    password_hash: &str,
) -> Result<User> {
    let row = client
        .query_one(
            format!(
                r#"
                INSERT INTO users (id, email, display_name, password_hash)
                VALUES ($1, $2, $3, $4)
                RETURNING {USER_COLUMNS}
                "#
            )
            .as_str(),
            &[&id, &email, &display_name, &password_hash],
        )
        .await?;
    row_to_user(&row)
}

/// Finds an active user by email address.
pub async fn find_by_email(client: &impl GenericClient, email: &str) -> Result<Option<User>> {
    let row = client
        .query_opt(
            format!(
                r#"
                SELECT {USER_COLUMNS}
                FROM users
                WHERE email = $1 AND is_active = true
                "#
            )
            .as_str(),
            &[&email],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Finds a user by ID.
pub async fn find_by_id(client: &impl GenericClient, user_id: &Uuid) -> Result<Option<User>> {
    let row = client
        .query_opt(
            format!(
                r#"
                SELECT {USER_COLUMNS}
                FROM users
                WHERE id = $1
                "#
            )
            .as_str(),
            &[user_id],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Returns the authoritative password version for an active user, or `None`
/// if the user no longer exists.
pub async fn find_password_version(
    client: &impl GenericClient,
    user_id: &Uuid,
) -> Result<Option<i32>> {
    let row = client
        .query_opt(
            r#"
            SELECT password_version
            FROM users
            WHERE id = $1 AND is_active = true
            "#,
            &[user_id],
        )
        .await?;
    Ok(row.map(|r| r.get("password_version")))
}

/// Replaces a user's password hash and bumps the password version,
/// returning the new version.
pub async fn update_password(
    client: &impl GenericClient,
    user_id: &Uuid,
    new_password_hash: &str,
) -> Result<i32> {
    let row = client
        .query_one(
            r#"
            UPDATE users
            SET
                password_hash = $1,
                password_version = password_version + 1,
                updated_at = NOW()
            WHERE id = $2
            RETURNING password_version
            "#,
            &[&new_password_hash, user_id],
        )
        .await?;
    Ok(row.get("password_version"))
}
