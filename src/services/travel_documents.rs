use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::travel_document::TravelDocumentView;
use crate::repositories::travel_document::{self as document_repo, DocumentFields};
use crate::state::AppState;

/// Lists a user's travel documents with masked numbers.
pub async fn list_documents(state: &AppState, user_id: Uuid) -> Result<Vec<TravelDocumentView>> {
    let client = state.db.get().await?;
    let documents = document_repo::list_for_user(&client, &user_id).await?;
    Ok(documents.into_iter().map(TravelDocumentView::from).collect())
}

/// Fetches one of a user's travel documents with a masked number.
pub async fn get_document(
    state: &AppState,
    user_id: Uuid,
    document_id: Uuid,
) -> Result<TravelDocumentView> {
    let client = state.db.get().await?;
    let document = document_repo::find_by_id(&client, &document_id, &user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(TravelDocumentView::from(document))
}

/// Creates a travel document. A document created as primary demotes any
/// existing primary of the same type in the same transaction.
pub async fn create_document(
    state: &AppState,
    user_id: Uuid,
    fields: &DocumentFields<'_>,
) -> Result<TravelDocumentView> {
    let mut client = state.db.get().await?;
    let tx = client.transaction().await?;

    if fields.is_primary {
        document_repo::lock_document_group(&tx, &user_id, fields.doc_type).await?;
    }
    let document = document_repo::insert(&tx, &user_id, fields).await?;
    if document.is_primary {
        document_repo::unset_other_primaries(&tx, &user_id, &document.doc_type, &document.id)
            .await?;
    }

    tx.commit().await?;
    tracing::info!("Created travel document {} for user {}", document.id, user_id);
    Ok(TravelDocumentView::from(document))
}

/// Updates a travel document, maintaining the single-primary invariant.
pub async fn update_document(
    state: &AppState,
    user_id: Uuid,
    document_id: Uuid,
    fields: &DocumentFields<'_>,
) -> Result<TravelDocumentView> {
    let mut client = state.db.get().await?;
    let tx = client.transaction().await?;

    if fields.is_primary {
        document_repo::lock_document_group(&tx, &user_id, fields.doc_type).await?;
    }
    let document = document_repo::update(&tx, &document_id, &user_id, fields).await?;
    if document.is_primary {
        document_repo::unset_other_primaries(&tx, &user_id, &document.doc_type, &document.id)
            .await?;
    }

    tx.commit().await?;
    Ok(TravelDocumentView::from(document))
}

/// Marks a document as the primary of its type, demoting any sibling.
///
/// The demote and the promote run in one transaction, so concurrent calls
/// cannot leave two primaries for the same `(user, doc_type)`.
pub async fn set_as_primary(
    state: &AppState,
    user_id: Uuid,
    document_id: Uuid,
) -> Result<TravelDocumentView> {
    let mut client = state.db.get().await?;
    let tx = client.transaction().await?;

    let existing = document_repo::find_by_id(&tx, &document_id, &user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    document_repo::lock_document_group(&tx, &user_id, &existing.doc_type).await?;
    document_repo::unset_other_primaries(&tx, &user_id, &existing.doc_type, &document_id).await?;
    let document = document_repo::update(
        &tx,
        &document_id,
        &user_id,
        &DocumentFields {
            doc_type: &existing.doc_type,
            name: &existing.name,
            issuing_country: existing.issuing_country.as_deref(),
            document_number: existing.document_number.as_deref(),
            issue_date: existing.issue_date,
            expiry_date: existing.expiry_date,
            notes: existing.notes.as_deref(),
            is_primary: true,
            alert_days_before: existing.alert_days_before,
        },
    )
    .await?;

    tx.commit().await?;
    tracing::info!(
        "Set travel document {} as primary {} for user {}",
        document.id,
        document.doc_type,
        user_id
    );
    Ok(TravelDocumentView::from(document))
}

/// Deletes one of a user's travel documents.
pub async fn delete_document(state: &AppState, user_id: Uuid, document_id: Uuid) -> Result<()> {
    let client = state.db.get().await?;
    document_repo::delete(&client, &document_id, &user_id).await
}
