use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    middleware_layer::auth::AuthContext,
    repositories::travel_document::DocumentFields,
    services::travel_documents as documents_service,
    state::AppState,
};

/// The request payload for creating or updating a travel document.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequest {
    pub doc_type: String,
    pub name: String,
    pub issuing_country: Option<String>,
    pub document_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    pub alert_days_before: Option<i32>,
}

impl DocumentRequest {
    fn validate(&self) -> Result<()> {
        if self.doc_type.trim().is_empty() {
            return Err(AppError::Validation("Document type cannot be empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Document name cannot be empty".to_string()));
        }
        if let Some(days) = self.alert_days_before {
            if days < 0 {
                return Err(AppError::Validation(
                    "Expiry alert days cannot be negative".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn as_fields(&self) -> DocumentFields<'_> {
        DocumentFields {
            doc_type: &self.doc_type,
            name: &self.name,
            issuing_country: self.issuing_country.as_deref(),
            document_number: self.document_number.as_deref(),
            issue_date: self.issue_date,
            expiry_date: self.expiry_date,
            notes: self.notes.as_deref(),
            is_primary: self.is_primary,
            alert_days_before: self.alert_days_before,
        }
    }
}

/// Lists the user's travel documents. Numbers are masked.
#[axum::debug_handler]
pub async fn list_documents(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Response> {
    let documents = documents_service::list_documents(&state, auth.user_id).await?;
    Ok((StatusCode::OK, Json(documents)).into_response())
}

/// Fetches one travel document. The number is masked.
#[axum::debug_handler]
pub async fn get_document(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(document_id): Path<Uuid>,
) -> Result<Response> {
    let document = documents_service::get_document(&state, auth.user_id, document_id).await?;
    Ok((StatusCode::OK, Json(document)).into_response())
}

/// Creates a travel document.
#[axum::debug_handler]
pub async fn create_document(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<DocumentRequest>,
) -> Result<Response> {
    payload.validate()?;
    let document =
        documents_service::create_document(&state, auth.user_id, &payload.as_fields()).await?;
    Ok((StatusCode::CREATED, Json(document)).into_response())
}

/// Updates a travel document.
#[axum::debug_handler]
pub async fn update_document(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(document_id): Path<Uuid>,
    Json(payload): Json<DocumentRequest>,
) -> Result<Response> {
    payload.validate()?;
    let document =
        documents_service::update_document(&state, auth.user_id, document_id, &payload.as_fields())
            .await?;
    Ok((StatusCode::OK, Json(document)).into_response())
}

/// Marks a travel document as the primary of its type.
#[axum::debug_handler]
pub async fn set_primary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(document_id): Path<Uuid>,
) -> Result<Response> {
    let document = documents_service::set_as_primary(&state, auth.user_id, document_id).await?;
    Ok((StatusCode::OK, Json(document)).into_response())
}

/// Deletes a travel document.
#[axum::debug_handler]
pub async fn delete_document(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(document_id): Path<Uuid>,
) -> Result<Response> {
    documents_service::delete_document(&state, auth.user_id, document_id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
