use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::backup::document::{BackupDocument, ChecklistSnapshot, SchemaVersion, TripSnapshot};
use crate::error::{AppError, Result};
use crate::repositories::{collections as collections_repo, travel_document as document_repo, trip as trip_repo};
use crate::state::AppState;

/// Knobs accepted by the restore endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RestoreOptions {
    /// Delete the user's existing data before importing. When false the
    /// backup is merged on top of what is already there.
    pub clear_existing_data: bool,
    /// Import photo metadata rows. Binary files are never part of a backup.
    pub import_photos: bool,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            clear_existing_data: false,
            import_photos: true,
        }
    }
}

/// Per-category imported row counts.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreStats {
    pub tags: usize,
    pub companions: usize,
    pub location_categories: usize,
    pub checklists: usize,
    pub travel_documents: usize,
    pub trip_series: usize,
    pub trips: usize,
    pub locations: usize,
    pub activities: usize,
    pub transportation: usize,
    pub lodging: usize,
    pub journal_entries: usize,
    pub photo_albums: usize,
    pub photos: usize,
    pub weather_records: usize,
    pub entity_links: usize,
}

/// What a completed restore reports back.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOutcome {
    pub stats: RestoreStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Validates a backup document and imports it for the given user.
///
/// Validation is fail-fast: nothing is written until the schema version is
/// recognized. All writes run in a single transaction, so a failure partway
/// through leaves the account untouched.
pub async fn restore_from_backup(
    state: &AppState,
    user_id: Uuid,
    document: BackupDocument,
    options: &RestoreOptions,
) -> Result<RestoreOutcome> {
    let version = SchemaVersion::parse(&document.version).ok_or_else(|| {
        AppError::Validation(format!("Unsupported backup version: {}", document.version))
    })?;
    let document = version.normalize(document);

    let mut client = state.db.get().await?;
    let tx = client.transaction().await?;

    if options.clear_existing_data {
        clear_user_data(&tx, &user_id).await?;
    }

    let mut stats = RestoreStats::default();
    let mut warnings = Vec::new();

    let mut tag_ids = HashMap::new();
    for tag in &document.tags {
        let id = collections_repo::upsert_tag(&tx, &user_id, &tag.name, tag.color.as_deref()).await?;
        tag_ids.insert(tag.name.clone(), id);
        stats.tags += 1;
    }

    let mut companion_ids = HashMap::new();
    for companion in &document.companions {
        let id = collections_repo::upsert_companion(
            &tx,
            &user_id,
            &companion.name,
            companion.email.as_deref(),
            companion.notes.as_deref(),
        )
        .await?;
        companion_ids.insert(companion.name.clone(), id);
        stats.companions += 1;
    }

    let mut category_ids = HashMap::new();
    for category in &document.location_categories {
        let id = collections_repo::upsert_location_category(
            &tx,
            &user_id,
            &category.name,
            category.icon.as_deref(),
        )
        .await?;
        category_ids.insert(category.name.clone(), id);
        stats.location_categories += 1;
    }

    let mut series_ids = HashMap::new();
    for series in &document.trip_series {
        let id = collections_repo::upsert_trip_series(
            &tx,
            &user_id,
            &series.name,
            series.description.as_deref(),
        )
        .await?;
        series_ids.insert(series.name.clone(), id);
        stats.trip_series += 1;
    }

    for checklist in &document.checklists {
        insert_checklist(&tx, &user_id, None, checklist).await?;
        stats.checklists += 1;
    }

    for snapshot in &document.travel_documents {
        if snapshot.is_primary {
            document_repo::lock_document_group(&tx, &user_id, &snapshot.doc_type).await?;
        }
        // Numbers in a backup are already masked; they are imported verbatim.
        let inserted = document_repo::insert(
            &tx,
            &user_id,
            &document_repo::DocumentFields {
                doc_type: &snapshot.doc_type,
                name: &snapshot.name,
                issuing_country: snapshot.issuing_country.as_deref(),
                document_number: snapshot.document_number.as_deref(),
                issue_date: snapshot.issue_date,
                expiry_date: snapshot.expiry_date,
                notes: snapshot.notes.as_deref(),
                is_primary: snapshot.is_primary,
                alert_days_before: snapshot.alert_days_before,
            },
        )
        .await?;
        if inserted.is_primary {
            document_repo::unset_other_primaries(&tx, &user_id, &inserted.doc_type, &inserted.id)
                .await?;
        }
        stats.travel_documents += 1;
    }

    for trip in &document.trips {
        let series_id = match &trip.series {
            Some(name) => match series_ids.get(name) {
                Some(id) => Some(*id),
                None => {
                    warnings.push(format!(
                        "Trip '{}' references unknown series '{}'",
                        trip.name, name
                    ));
                    None
                }
            },
            None => None,
        };
        restore_trip(
            &tx,
            &user_id,
            trip,
            series_id.as_ref(),
            &mut tag_ids,
            &mut companion_ids,
            &category_ids,
            options,
            &mut stats,
        )
        .await?;
        stats.trips += 1;
    }

    tx.commit().await?;

    tracing::info!(
        "Restored backup for user {}: {} trips, {} warnings (clear_existing_data={})",
        user_id,
        stats.trips,
        warnings.len(),
        options.clear_existing_data
    );

    Ok(RestoreOutcome { stats, warnings })
}

/// Wipes the user's restorable data. Trips go first so their child rows
/// cascade before the collections they reference are removed.
async fn clear_user_data(
    client: &impl deadpool_postgres::GenericClient,
    user_id: &Uuid,
) -> Result<()> {
    trip_repo::delete_all_trips(client, user_id).await?;
    collections_repo::delete_global_checklists(client, user_id).await?;
    collections_repo::delete_all_tags(client, user_id).await?;
    collections_repo::delete_all_companions(client, user_id).await?;
    collections_repo::delete_all_location_categories(client, user_id).await?;
    collections_repo::delete_all_trip_series(client, user_id).await?;
    document_repo::delete_all_for_user(client, user_id).await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn restore_trip(
    client: &impl deadpool_postgres::GenericClient,
    user_id: &Uuid,
    trip: &TripSnapshot,
    series_id: Option<&Uuid>,
    tag_ids: &mut HashMap<String, Uuid>,
    companion_ids: &mut HashMap<String, Uuid>,
    category_ids: &HashMap<String, Uuid>,
    options: &RestoreOptions,
    stats: &mut RestoreStats,
) -> Result<()> {
    let trip_id = trip_repo::insert_trip(client, user_id, series_id, trip).await?;

    for name in &trip.tags {
        // Legacy documents may reference a tag no top-level entry declares;
        // create it bare rather than dropping the link.
        let tag_id = match tag_ids.get(name) {
            Some(id) => *id,
            None => {
                let id = collections_repo::upsert_tag(client, user_id, name, None).await?;
                tag_ids.insert(name.clone(), id);
                stats.tags += 1;
                id
            }
        };
        trip_repo::link_trip_tag(client, &trip_id, &tag_id).await?;
    }
    for name in &trip.companions {
        let companion_id = match companion_ids.get(name) {
            Some(id) => *id,
            None => {
                let id =
                    collections_repo::upsert_companion(client, user_id, name, None, None).await?;
                companion_ids.insert(name.clone(), id);
                stats.companions += 1;
                id
            }
        };
        trip_repo::link_trip_companion(client, &trip_id, &companion_id).await?;
    }
    for code in &trip.languages {
        trip_repo::insert_trip_language(client, &trip_id, code).await?;
    }

    let mut location_ids = HashMap::new();
    for location in &trip.locations {
        let category_id = location
            .category
            .as_ref()
            .and_then(|name| category_ids.get(name));
        let id = trip_repo::insert_location(client, &trip_id, category_id, location).await?;
        location_ids.insert(location.name.clone(), id);
        stats.locations += 1;
    }

    for activity in &trip.activities {
        let location_id = activity
            .location
            .as_ref()
            .and_then(|name| location_ids.get(name));
        trip_repo::insert_activity(client, &trip_id, location_id, activity).await?;
        stats.activities += 1;
    }

    for leg in &trip.transportation {
        trip_repo::insert_transportation(client, &trip_id, leg).await?;
        stats.transportation += 1;
    }

    for stay in &trip.lodging {
        trip_repo::insert_lodging(client, &trip_id, stay).await?;
        stats.lodging += 1;
    }

    for entry in &trip.journal_entries {
        trip_repo::insert_journal_entry(client, &trip_id, entry).await?;
        stats.journal_entries += 1;
    }

    if options.import_photos {
        for album in &trip.photo_albums {
            let album_id = trip_repo::insert_photo_album(client, &trip_id, album).await?;
            stats.photo_albums += 1;
            for photo in &album.photos {
                trip_repo::insert_photo(client, &album_id, photo).await?;
                stats.photos += 1;
            }
        }
    }

    for record in &trip.weather {
        trip_repo::insert_weather(client, &trip_id, record).await?;
        stats.weather_records += 1;
    }

    for checklist in &trip.checklists {
        insert_checklist(client, user_id, Some(&trip_id), checklist).await?;
        stats.checklists += 1;
    }

    for link in &trip.entity_links {
        trip_repo::insert_entity_link(client, &trip_id, link).await?;
        stats.entity_links += 1;
    }

    Ok(())
}

async fn insert_checklist(
    client: &impl deadpool_postgres::GenericClient,
    user_id: &Uuid,
    trip_id: Option<&Uuid>,
    snapshot: &ChecklistSnapshot,
) -> Result<Uuid> {
    let items: Vec<(String, bool, i32)> = snapshot
        .items
        .iter()
        .map(|item| (item.text.clone(), item.is_done, item.sort_order))
        .collect();
    collections_repo::insert_checklist(client, user_id, trip_id, &snapshot.name, &items).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_to_merge_with_photos() {
        let options: RestoreOptions = sonic_rs::from_str("{}").unwrap();
        assert!(!options.clear_existing_data);
        assert!(options.import_photos);
    }

    #[test]
    fn options_accept_camel_case_fields() {
        let options: RestoreOptions =
            sonic_rs::from_str(r#"{"clearExistingData":true,"importPhotos":false}"#).unwrap();
        assert!(options.clear_existing_data);
        assert!(!options.import_photos);
    }

    #[test]
    fn unsupported_version_is_rejected_before_parsing_anything_else() {
        assert!(SchemaVersion::parse("3.0.0").is_none());
    }

    #[test]
    fn legacy_documents_keep_name_refs_their_top_level_never_declared() {
        // A 1.1 export from another tool can reference tags and companions
        // on a trip without listing them in the document's own collections;
        // normalization must keep those references so the import can create
        // the rows on the fly instead of dropping the links.
        let json = serde_json::json!({
            "version": "1.1.0",
            "exportDate": "2024-05-01T00:00:00Z",
            "user": { "email": "ada@example.com", "displayName": "Ada" },
            "trips": [{
                "name": "Dolomites",
                "tags": ["alpine"],
                "companions": ["Grace"],
            }],
        })
        .to_string();

        let document: BackupDocument = sonic_rs::from_str(&json).unwrap();
        let version = SchemaVersion::parse(&document.version).unwrap();
        let document = version.normalize(document);

        assert!(document.tags.is_empty());
        assert!(document.companions.is_empty());
        assert_eq!(document.trips[0].tags, vec!["alpine".to_string()]);
        assert_eq!(document.trips[0].companions, vec!["Grace".to_string()]);
    }

    #[test]
    fn stats_serialize_camel_case() {
        let stats = RestoreStats {
            journal_entries: 3,
            ..Default::default()
        };
        let json = sonic_rs::to_string(&stats).unwrap();
        assert!(json.contains("\"journalEntries\":3"));
        assert!(json.contains("\"travelDocuments\":0"));
    }

    #[test]
    fn outcome_omits_empty_warnings() {
        let outcome = RestoreOutcome {
            stats: RestoreStats::default(),
            warnings: vec![],
        };
        let json = sonic_rs::to_string(&outcome).unwrap();
        assert!(!json.contains("warnings"));
    }
}
