use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    backup::document::BackupDocument,
    backup::restore::{RestoreOptions, RestoreStats},
    error::{AppError, Result},
    middleware_layer::auth::AuthContext,
    services::backup as backup_service,
    state::AppState,
};

/// The request payload for a restore.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRequest {
    pub backup_data: BackupDocument,
    #[serde(default)]
    pub options: RestoreOptions,
}

/// The response payload for a completed restore.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResponse {
    pub success: bool,
    pub message: String,
    pub stats: RestoreStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Streams a signed backup of the user's data as a file download.
#[axum::debug_handler]
pub async fn export_backup(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Response> {
    tracing::info!("Backup export requested by user {}", auth.user_id);

    let document = backup_service::export_signed_backup(&state, auth.user_id).await?;
    let body = sonic_rs::to_string(&document)
        .map_err(|e| AppError::Internal(format!("Failed to serialize backup: {}", e)))?;

    let filename = format!("wayfarer-backup-{}.json", Utc::now().format("%Y-%m-%d"));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}

/// Verifies and imports an uploaded backup.
#[axum::debug_handler]
pub async fn restore_backup(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<RestoreRequest>,
) -> Result<Response> {
    tracing::info!(
        "Backup restore requested by user {} (clear_existing_data={})",
        auth.user_id,
        payload.options.clear_existing_data
    );

    let outcome = backup_service::restore_backup(
        &state,
        auth.user_id,
        payload.backup_data,
        &payload.options,
    )
    .await?;

    let response = RestoreResponse {
        success: true,
        message: format!("Backup restored: {} trips imported", outcome.stats.trips),
        stats: outcome.stats,
        warnings: outcome.warnings,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
