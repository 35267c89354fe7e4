use deadpool_postgres::GenericClient;
use tokio_postgres::Row;
use uuid::Uuid;
use crate::{
    error::Result,
    models::collections::{Checklist, ChecklistItem, Companion, LocationCategory, Tag, TripSeries},
};

fn row_to_tag(row: &Row) -> Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        color: row.try_get("color")?,
    })
}

/// Lists a user's tags ordered by name.
pub async fn list_tags(client: &impl GenericClient, user_id: &Uuid) -> Result<Vec<Tag>> {
    let rows = client
        .query(
            "SELECT id, user_id, name, color FROM tags WHERE user_id = $1 ORDER BY name",
            &[user_id],
        )
        .await?;
    rows.iter().map(row_to_tag).collect()
}

/// Inserts a tag by name or updates its color, returning the row ID.
/// Restore relies on this to re-link name references.
pub async fn upsert_tag(
    client: &impl GenericClient,
    user_id: &Uuid,
    name: &str,
    color: Option<&str>,
) -> Result<Uuid> {
    let row = client
        .query_one(
            r#"
            INSERT INTO tags (id, user_id, name, color)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, name)
            DO UPDATE SET color = COALESCE(EXCLUDED.color, tags.color)
            RETURNING id
            "#,
            &[&Uuid::new_v4(), user_id, &name, &color],
        )
        .await?;
    Ok(row.get("id"))
}

pub async fn delete_all_tags(client: &impl GenericClient, user_id: &Uuid) -> Result<u64> {
    Ok(client
        .execute("DELETE FROM tags WHERE user_id = $1", &[user_id])
        .await?)
}

fn row_to_companion(row: &Row) -> Result<Companion> {
    Ok(Companion {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        notes: row.try_get("notes")?,
    })
}

/// Lists a user's companions ordered by name.
pub async fn list_companions(client: &impl GenericClient, user_id: &Uuid) -> Result<Vec<Companion>> {
    let rows = client
        .query(
            "SELECT id, user_id, name, email, notes FROM companions WHERE user_id = $1 ORDER BY name",
            &[user_id],
        )
        .await?;
    rows.iter().map(row_to_companion).collect()
}

/// Inserts a companion by name or refreshes its contact details, returning
/// the row ID.
pub async fn upsert_companion(
    client: &impl GenericClient,
    user_id: &Uuid,
    name: &str,
    email: Option<&str>,
    notes: Option<&str>,
) -> Result<Uuid> {
    let row = client
        .query_one(
            r#"
            INSERT INTO companions (id, user_id, name, email, notes)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, name)
            DO UPDATE SET
                email = COALESCE(EXCLUDED.email, companions.email),
                notes = COALESCE(EXCLUDED.notes, companions.notes)
            RETURNING id
            "#,
            &[&Uuid::new_v4(), user_id, &name, &email, &notes],
        )
        .await?;
    Ok(row.get("id"))
}

pub async fn delete_all_companions(client: &impl GenericClient, user_id: &Uuid) -> Result<u64> {
    Ok(client
        .execute("DELETE FROM companions WHERE user_id = $1", &[user_id])
        .await?)
}

fn row_to_category(row: &Row) -> Result<LocationCategory> {
    Ok(LocationCategory {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        icon: row.try_get("icon")?,
    })
}

/// Lists a user's location categories ordered by name.
pub async fn list_location_categories(
    client: &impl GenericClient,
    user_id: &Uuid,
) -> Result<Vec<LocationCategory>> {
    let rows = client
        .query(
            "SELECT id, user_id, name, icon FROM location_categories WHERE user_id = $1 ORDER BY name",
            &[user_id],
        )
        .await?;
    rows.iter().map(row_to_category).collect()
}

pub async fn upsert_location_category(
    client: &impl GenericClient,
    user_id: &Uuid,
    name: &str,
    icon: Option<&str>,
) -> Result<Uuid> {
    let row = client
        .query_one(
            r#"
            INSERT INTO location_categories (id, user_id, name, icon)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, name)
            DO UPDATE SET icon = COALESCE(EXCLUDED.icon, location_categories.icon)
            RETURNING id
            "#,
            &[&Uuid::new_v4(), user_id, &name, &icon],
        )
        .await?;
    Ok(row.get("id"))
}

pub async fn delete_all_location_categories(
    client: &impl GenericClient,
    user_id: &Uuid,
) -> Result<u64> {
    Ok(client
        .execute(
            "DELETE FROM location_categories WHERE user_id = $1",
            &[user_id],
        )
        .await?)
}

fn row_to_checklist(row: &Row) -> Result<Checklist> {
    Ok(Checklist {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        trip_id: row.try_get("trip_id")?,
        name: row.try_get("name")?,
    })
}

fn row_to_checklist_item(row: &Row) -> Result<ChecklistItem> {
    Ok(ChecklistItem {
        id: row.try_get("id")?,
        checklist_id: row.try_get("checklist_id")?,
        text: row.try_get("text")?,
        is_done: row.try_get("is_done")?,
        sort_order: row.try_get("sort_order")?,
    })
}

/// Lists a user's global checklists (those not attached to any trip).
pub async fn list_global_checklists(
    client: &impl GenericClient,
    user_id: &Uuid,
) -> Result<Vec<Checklist>> {
    let rows = client
        .query(
            "SELECT id, user_id, trip_id, name FROM checklists WHERE user_id = $1 AND trip_id IS NULL ORDER BY name",
            &[user_id],
        )
        .await?;
    rows.iter().map(row_to_checklist).collect()
}

/// Lists checklists attached to any of the given trips.
pub async fn list_checklists_for_trips(
    client: &impl GenericClient,
    trip_ids: &[Uuid],
) -> Result<Vec<Checklist>> {
    let ids = trip_ids.to_vec();
    let rows = client
        .query(
            "SELECT id, user_id, trip_id, name FROM checklists WHERE trip_id = ANY($1) ORDER BY name",
            &[&ids],
        )
        .await?;
    rows.iter().map(row_to_checklist).collect()
}

/// Lists the items of the given checklists.
pub async fn list_checklist_items(
    client: &impl GenericClient,
    checklist_ids: &[Uuid],
) -> Result<Vec<ChecklistItem>> {
    let ids = checklist_ids.to_vec();
    let rows = client
        .query(
            "SELECT id, checklist_id, text, is_done, sort_order FROM checklist_items WHERE checklist_id = ANY($1) ORDER BY sort_order",
            &[&ids],
        )
        .await?;
    rows.iter().map(row_to_checklist_item).collect()
}

/// Inserts a checklist with its items, returning the checklist ID.
pub async fn insert_checklist(
    client: &impl GenericClient,
    user_id: &Uuid,
    trip_id: Option<&Uuid>,
    name: &str,
    items: &[(String, bool, i32)],
) -> Result<Uuid> {
    let checklist_id = Uuid::new_v4();
    client
        .execute(
            "INSERT INTO checklists (id, user_id, trip_id, name) VALUES ($1, $2, $3, $4)",
            &[&checklist_id, user_id, &trip_id, &name],
        )
        .await?;

    for (text, is_done, sort_order) in items {
        client
            .execute(
                "INSERT INTO checklist_items (id, checklist_id, text, is_done, sort_order) VALUES ($1, $2, $3, $4, $5)",
                &[&Uuid::new_v4(), &checklist_id, text, is_done, sort_order],
            )
            .await?;
    }

    Ok(checklist_id)
}

/// Deletes a user's global checklists (items cascade).
pub async fn delete_global_checklists(
    client: &impl GenericClient,
    user_id: &Uuid,
) -> Result<u64> {
    Ok(client
        .execute(
            "DELETE FROM checklists WHERE user_id = $1 AND trip_id IS NULL",
            &[user_id],
        )
        .await?)
}

fn row_to_series(row: &Row) -> Result<TripSeries> {
    Ok(TripSeries {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Lists a user's trip series ordered by name.
pub async fn list_trip_series(
    client: &impl GenericClient,
    user_id: &Uuid,
) -> Result<Vec<TripSeries>> {
    let rows = client
        .query(
            "SELECT id, user_id, name, description, created_at FROM trip_series WHERE user_id = $1 ORDER BY name",
            &[user_id],
        )
        .await?;
    rows.iter().map(row_to_series).collect()
}

pub async fn upsert_trip_series(
    client: &impl GenericClient,
    user_id: &Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<Uuid> {
    let row = client
        .query_one(
            r#"
            INSERT INTO trip_series (id, user_id, name, description)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, name)
            DO UPDATE SET description = COALESCE(EXCLUDED.description, trip_series.description)
            RETURNING id
            "#,
            &[&Uuid::new_v4(), user_id, &name, &description],
        )
        .await?;
    Ok(row.get("id"))
}

pub async fn delete_all_trip_series(client: &impl GenericClient, user_id: &Uuid) -> Result<u64> {
    Ok(client
        .execute("DELETE FROM trip_series WHERE user_id = $1", &[user_id])
        .await?)
}
