use chrono::NaiveDate;
use deadpool_postgres::GenericClient;
use tokio_postgres::Row;
use uuid::Uuid;
use crate::{
    error::{AppError, Result},
    models::travel_document::TravelDocument,
};

const DOCUMENT_COLUMNS: &str = "id, user_id, doc_type, name, issuing_country, document_number, \
     issue_date, expiry_date, notes, is_primary, alert_days_before, created_at, updated_at";

fn row_to_document(row: &Row) -> Result<TravelDocument> {
    Ok(TravelDocument {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        doc_type: row.try_get("doc_type")?,
        name: row.try_get("name")?,
        issuing_country: row.try_get("issuing_country")?,
        document_number: row.try_get("document_number")?,
        issue_date: row.try_get("issue_date")?,
        expiry_date: row.try_get("expiry_date")?,
        notes: row.try_get("notes")?,
        is_primary: row.try_get("is_primary")?,
        alert_days_before: row.try_get("alert_days_before")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// The writable fields of a travel document.
pub struct DocumentFields<'a> {
    pub doc_type: &'a str,
    pub name: &'a str,
    pub issuing_country: Option<&'a str>,
    pub document_number: Option<&'a str>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<&'a str>,
    pub is_primary: bool,
    pub alert_days_before: Option<i32>,
}

/// Lists a user's travel documents, primaries first.
pub async fn list_for_user(
    client: &impl GenericClient,
    user_id: &Uuid,
) -> Result<Vec<TravelDocument>> {
    let rows = client
        .query(
            format!(
                r#"
                SELECT {DOCUMENT_COLUMNS}
                FROM travel_documents
                WHERE user_id = $1
                ORDER BY is_primary DESC, doc_type, name
                "#
            )
            .as_str(),
            &[user_id],
        )
        .await?;
    rows.iter().map(row_to_document).collect()
}

/// Finds one of a user's travel documents by ID.
pub async fn find_by_id(
    client: &impl GenericClient,
    document_id: &Uuid,
    user_id: &Uuid,
) -> Result<Option<TravelDocument>> {
    let row = client
        .query_opt(
            format!(
                r#"
                SELECT {DOCUMENT_COLUMNS}
                FROM travel_documents
                WHERE id = $1 AND user_id = $2
                "#
            )
            .as_str(),
            &[document_id, user_id],
        )
        .await?;
    row.map(|r| row_to_document(&r)).transpose()
}

/// Inserts a travel document.
pub async fn insert(
    client: &impl GenericClient,
    user_id: &Uuid,
    fields: &DocumentFields<'_>,
) -> Result<TravelDocument> {
    let row = client
        .query_one(
            format!(
                r#"
                INSERT INTO travel_documents
                    (id, user_id, doc_type, name, issuing_country, document_number,
                     issue_date, expiry_date, notes, is_primary, alert_days_before)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                RETURNING {DOCUMENT_COLUMNS}
                "#
            )
            .as_str(),
            &[
                &Uuid::new_v4(),
                user_id,
                &fields.doc_type,
                &fields.name,
                &fields.issuing_country,
                &fields.document_number,
                &fields.issue_date,
                &fields.expiry_date,
                &fields.notes,
                &fields.is_primary,
                &fields.alert_days_before,
            ],
        )
        .await?;
    row_to_document(&row)
}

/// Updates a travel document owned by the user.
pub async fn update(
    client: &impl GenericClient,
    document_id: &Uuid,
    user_id: &Uuid,
    fields: &DocumentFields<'_>,
) -> Result<TravelDocument> {
    let row = client
        .query_opt(
            format!(
                r#"
                UPDATE travel_documents
                SET doc_type = $3, name = $4, issuing_country = $5, document_number = $6,
                    issue_date = $7, expiry_date = $8, notes = $9, is_primary = $10,
                    alert_days_before = $11, updated_at = NOW()
                WHERE id = $1 AND user_id = $2
                RETURNING {DOCUMENT_COLUMNS}
                "#
            )
            .as_str(),
            &[
                document_id,
                user_id,
                &fields.doc_type,
                &fields.name,
                &fields.issuing_country,
                &fields.document_number,
                &fields.issue_date,
                &fields.expiry_date,
                &fields.notes,
                &fields.is_primary,
                &fields.alert_days_before,
            ],
        )
        .await?;
    row.ok_or(AppError::NotFound).and_then(|r| row_to_document(&r))
}

/// Row-locks every document of one `(user, doc_type)` group until the
/// transaction ends.
const GROUP_LOCK_SQL: &str =
    "SELECT id FROM travel_documents WHERE user_id = $1 AND doc_type = $2 FOR UPDATE";

/// Serializes writers of one `(user, doc_type)` group.
///
/// Any transaction that sets `is_primary` must take this lock before
/// writing: under READ COMMITTED, two concurrent primary writes would
/// otherwise each run `unset_other_primaries` against a snapshot that
/// cannot see the other's uncommitted row, and both would commit as
/// primary. The second locker blocks here until the first commits and
/// then sees its row.
pub async fn lock_document_group(
    client: &impl GenericClient,
    user_id: &Uuid,
    doc_type: &str,
) -> Result<()> {
    client.execute(GROUP_LOCK_SQL, &[user_id, &doc_type]).await?;
    Ok(())
}

/// Clears `is_primary` on every other document of the same user and type.
/// Must run in the same transaction as the write that sets it, after
/// [`lock_document_group`].
pub async fn unset_other_primaries(
    client: &impl GenericClient,
    user_id: &Uuid,
    doc_type: &str,
    keep_id: &Uuid,
) -> Result<u64> {
    Ok(client
        .execute(
            r#"
            UPDATE travel_documents
            SET is_primary = false, updated_at = NOW()
            WHERE user_id = $1 AND doc_type = $2 AND id <> $3 AND is_primary = true
            "#,
            &[user_id, &doc_type, keep_id],
        )
        .await?)
}

/// Deletes one of a user's travel documents.
pub async fn delete(
    client: &impl GenericClient,
    document_id: &Uuid,
    user_id: &Uuid,
) -> Result<()> {
    let affected = client
        .execute(
            "DELETE FROM travel_documents WHERE id = $1 AND user_id = $2",
            &[document_id, user_id],
        )
        .await?;
    if affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Deletes every travel document owned by a user.
pub async fn delete_all_for_user(client: &impl GenericClient, user_id: &Uuid) -> Result<u64> {
    Ok(client
        .execute("DELETE FROM travel_documents WHERE user_id = $1", &[user_id])
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_lock_serializes_one_document_type() {
        // The lock must block concurrent primary writers for the same user
        // and type, and must not touch other groups.
        assert!(GROUP_LOCK_SQL.ends_with("FOR UPDATE"));
        assert!(GROUP_LOCK_SQL.contains("user_id = $1 AND doc_type = $2"));
    }
}
