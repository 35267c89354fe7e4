use uuid::Uuid;

use crate::backup::document::BackupDocument;
use crate::backup::export::create_backup;
use crate::backup::integrity;
use crate::backup::restore::{restore_from_backup, RestoreOptions, RestoreOutcome};
use crate::error::Result;
use crate::state::AppState;

/// Assembles and signs a full backup of the user's data.
pub async fn export_signed_backup(state: &AppState, user_id: Uuid) -> Result<BackupDocument> {
    let mut document = create_backup(state, user_id).await?;
    let block = integrity::sign(&document, &state.config.backup_signing_secret)?;
    document.integrity = Some(block);
    Ok(document)
}

/// Verifies a backup's signature and imports it for the user.
///
/// Verification runs first so a tampered or mis-signed file is rejected
/// before any row is touched.
pub async fn restore_backup(
    state: &AppState,
    user_id: Uuid,
    document: BackupDocument,
    options: &RestoreOptions,
) -> Result<RestoreOutcome> {
    integrity::verify(&document, &state.config.backup_signing_secret)?;
    restore_from_backup(state, user_id, document, options).await
}
