use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

use crate::backup::document::{
    ActivitySnapshot, BackupDocument, ChecklistItemSnapshot, ChecklistSnapshot, CompanionSnapshot,
    EntityLinkSnapshot, FlightTrackingSnapshot, JournalEntrySnapshot, LocationCategorySnapshot,
    LocationSnapshot, LodgingSnapshot, PhotoAlbumSnapshot, PhotoSnapshot, TagSnapshot,
    TransportationSnapshot, TravelDocumentSnapshot, TripSeriesSnapshot, TripSnapshot,
    UserProfileSnapshot, WeatherSnapshot, CURRENT_SCHEMA_VERSION,
};
use crate::error::{AppError, Result};
use crate::models::travel_document::mask_document_number;
use crate::repositories::{collections as collections_repo, travel_document as document_repo, trip as trip_repo, user as user_repo};
use crate::state::AppState;

/// How many trips are hydrated per round of queries. Bounds memory and
/// query width for users with many trips; the full per-trip graph is never
/// loaded in one unbounded query across all trips.
pub const TRIP_BATCH_SIZE: usize = 25;

/// Assembles a user's full data graph into an unsigned backup document.
///
/// The caller signs the document and attaches the integrity block.
pub async fn create_backup(state: &AppState, user_id: Uuid) -> Result<BackupDocument> {
    match build_document(state, user_id).await {
        Ok(document) => Ok(document),
        Err(AppError::NotFound) => Err(AppError::NotFound),
        Err(e) => Err(AppError::Internal(format!("Failed to create backup: {}", e))),
    }
}

async fn build_document(state: &AppState, user_id: Uuid) -> Result<BackupDocument> {
    let client = state.db.get().await?;
    let client = &client;

    let user = user_repo::find_by_id(client, &user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or(AppError::NotFound)?;

    let tags = collections_repo::list_tags(client, &user_id)
        .await?
        .into_iter()
        .map(|t| TagSnapshot {
            name: t.name,
            color: t.color,
        })
        .collect();

    let companions = collections_repo::list_companions(client, &user_id)
        .await?
        .into_iter()
        .map(|c| CompanionSnapshot {
            name: c.name,
            email: c.email,
            notes: c.notes,
        })
        .collect();

    let series_rows = collections_repo::list_trip_series(client, &user_id).await?;
    let series_names: HashMap<Uuid, String> = series_rows
        .iter()
        .map(|s| (s.id, s.name.clone()))
        .collect();
    let trip_series = series_rows
        .into_iter()
        .map(|s| TripSeriesSnapshot {
            name: s.name,
            description: s.description,
        })
        .collect();

    let location_categories = collections_repo::list_location_categories(client, &user_id)
        .await?
        .into_iter()
        .map(|c| LocationCategorySnapshot {
            name: c.name,
            icon: c.icon,
        })
        .collect();

    let checklists = export_global_checklists(client, &user_id).await?;

    let travel_documents = document_repo::list_for_user(client, &user_id)
        .await?
        .into_iter()
        .map(|d| TravelDocumentSnapshot {
            doc_type: d.doc_type,
            name: d.name,
            issuing_country: d.issuing_country,
            document_number: d.document_number.as_deref().map(mask_document_number),
            issue_date: d.issue_date,
            expiry_date: d.expiry_date,
            notes: d.notes,
            is_primary: d.is_primary,
            alert_days_before: d.alert_days_before,
        })
        .collect();

    let trip_ids = trip_repo::list_trip_ids(client, &user_id).await?;
    let mut trips = Vec::with_capacity(trip_ids.len());
    for batch in trip_ids.chunks(TRIP_BATCH_SIZE) {
        let batch_snapshots = export_trip_batch(client, &user_id, batch, &series_names).await?;
        trips.extend(batch_snapshots);
    }

    tracing::info!(
        "Assembled backup for user {}: {} trips, schema {}",
        user_id,
        trips.len(),
        CURRENT_SCHEMA_VERSION
    );

    Ok(BackupDocument {
        version: CURRENT_SCHEMA_VERSION.to_string(),
        export_date: Utc::now(),
        user: UserProfileSnapshot {
            email: user.email,
            display_name: user.display_name,
            timezone: user.timezone,
            home_currency: user.home_currency,
            distance_unit: user.distance_unit,
            weather_api_key: user.weather_api_key,
        },
        tags,
        companions,
        location_categories,
        checklists,
        travel_documents,
        trip_series,
        trips,
        integrity: None,
    })
}

async fn export_global_checklists(
    client: &impl deadpool_postgres::GenericClient,
    user_id: &Uuid,
) -> Result<Vec<ChecklistSnapshot>> {
    let lists = collections_repo::list_global_checklists(client, user_id).await?;
    let list_ids: Vec<Uuid> = lists.iter().map(|c| c.id).collect();
    let mut items_by_list = group_by(
        collections_repo::list_checklist_items(client, &list_ids).await?,
        |item| item.checklist_id,
    );

    Ok(lists
        .into_iter()
        .map(|list| ChecklistSnapshot {
            items: items_by_list
                .remove(&list.id)
                .unwrap_or_default()
                .into_iter()
                .map(|item| ChecklistItemSnapshot {
                    text: item.text,
                    is_done: item.is_done,
                    sort_order: item.sort_order,
                })
                .collect(),
            name: list.name,
        })
        .collect())
}

/// Hydrates one batch of trips into snapshots.
async fn export_trip_batch(
    client: &impl deadpool_postgres::GenericClient,
    user_id: &Uuid,
    trip_ids: &[Uuid],
    series_names: &HashMap<Uuid, String>,
) -> Result<Vec<TripSnapshot>> {
    let trips = trip_repo::load_trips(client, trip_ids).await?;

    let mut locations = group_by(trip_repo::load_locations(client, trip_ids).await?, |l| {
        l.trip_id
    });
    let mut activities = group_by(trip_repo::load_activities(client, trip_ids).await?, |a| {
        a.trip_id
    });
    let mut transportation = group_by(
        trip_repo::load_transportation(client, trip_ids).await?,
        |t| t.trip_id,
    );
    let mut lodging = group_by(trip_repo::load_lodging(client, trip_ids).await?, |l| {
        l.trip_id
    });
    let mut journal_entries = group_by(
        trip_repo::load_journal_entries(client, trip_ids).await?,
        |j| j.trip_id,
    );
    let mut weather = group_by(trip_repo::load_weather(client, trip_ids).await?, |w| {
        w.trip_id
    });
    let mut entity_links = group_by(trip_repo::load_entity_links(client, trip_ids).await?, |e| {
        e.trip_id
    });
    let mut tag_names = group_pairs(trip_repo::load_trip_tag_names(client, trip_ids).await?);
    let mut companion_names =
        group_pairs(trip_repo::load_trip_companion_names(client, trip_ids).await?);
    let mut languages = group_pairs(trip_repo::load_trip_languages(client, trip_ids).await?);

    // Albums need a second hop for their photo rows.
    let albums = trip_repo::load_photo_albums(client, trip_ids).await?;
    let album_ids: Vec<Uuid> = albums.iter().map(|a| a.id).collect();
    let mut photos_by_album = group_by(trip_repo::load_photos(client, &album_ids).await?, |p| {
        p.album_id
    });
    let mut albums_by_trip: HashMap<Uuid, Vec<PhotoAlbumSnapshot>> = HashMap::new();
    for album in albums {
        let photos = photos_by_album
            .remove(&album.id)
            .unwrap_or_default()
            .into_iter()
            .map(|p| PhotoSnapshot {
                file_name: p.file_name,
                caption: p.caption,
                taken_at: p.taken_at,
                latitude: p.latitude,
                longitude: p.longitude,
                sort_order: p.sort_order,
            })
            .collect();
        albums_by_trip
            .entry(album.trip_id)
            .or_default()
            .push(PhotoAlbumSnapshot {
                name: album.name,
                description: album.description,
                photos,
            });
    }

    let mut checklists_by_trip = export_trip_checklists(client, trip_ids).await?;

    let mut snapshots = Vec::with_capacity(trips.len());
    for trip in trips {
        if trip.user_id != *user_id {
            continue;
        }
        let trip_id = trip.id;
        snapshots.push(TripSnapshot {
            name: trip.name,
            description: trip.description,
            destination: trip.destination,
            start_date: trip.start_date,
            end_date: trip.end_date,
            series: trip
                .series_id
                .and_then(|id| series_names.get(&id).cloned()),
            tags: tag_names.remove(&trip_id).unwrap_or_default(),
            companions: companion_names.remove(&trip_id).unwrap_or_default(),
            languages: languages.remove(&trip_id).unwrap_or_default(),
            locations: locations
                .remove(&trip_id)
                .unwrap_or_default()
                .into_iter()
                .map(|l| LocationSnapshot {
                    name: l.name,
                    address: l.address,
                    latitude: l.latitude,
                    longitude: l.longitude,
                    category: l.category,
                    arrival_date: l.arrival_date,
                    departure_date: l.departure_date,
                    notes: l.notes,
                    sort_order: l.sort_order,
                })
                .collect(),
            activities: activities
                .remove(&trip_id)
                .unwrap_or_default()
                .into_iter()
                .map(|a| ActivitySnapshot {
                    name: a.name,
                    location: a.location_name,
                    scheduled_at: a.scheduled_at,
                    duration_minutes: a.duration_minutes,
                    cost: a.cost,
                    currency: a.currency,
                    notes: a.notes,
                })
                .collect(),
            transportation: transportation
                .remove(&trip_id)
                .unwrap_or_default()
                .into_iter()
                .map(|t| TransportationSnapshot {
                    mode: t.mode,
                    carrier: t.carrier,
                    departure_place: t.departure_place,
                    departure_time: t.departure_time,
                    arrival_place: t.arrival_place,
                    arrival_time: t.arrival_time,
                    confirmation_number: t.confirmation_number,
                    flight: t.flight.map(|f| FlightTrackingSnapshot {
                        flight_number: f.flight_number,
                        airline_code: f.airline_code,
                        departure_airport: f.departure_airport,
                        arrival_airport: f.arrival_airport,
                        status: f.status,
                    }),
                })
                .collect(),
            lodging: lodging
                .remove(&trip_id)
                .unwrap_or_default()
                .into_iter()
                .map(|l| LodgingSnapshot {
                    name: l.name,
                    address: l.address,
                    check_in: l.check_in,
                    check_out: l.check_out,
                    confirmation_number: l.confirmation_number,
                    cost: l.cost,
                    currency: l.currency,
                })
                .collect(),
            journal_entries: journal_entries
                .remove(&trip_id)
                .unwrap_or_default()
                .into_iter()
                .map(|j| JournalEntrySnapshot {
                    title: j.title,
                    body: j.body,
                    entry_date: j.entry_date,
                    mood: j.mood,
                })
                .collect(),
            photo_albums: albums_by_trip.remove(&trip_id).unwrap_or_default(),
            weather: weather
                .remove(&trip_id)
                .unwrap_or_default()
                .into_iter()
                .map(|w| WeatherSnapshot {
                    recorded_on: w.recorded_on,
                    temperature_high: w.temperature_high,
                    temperature_low: w.temperature_low,
                    conditions: w.conditions,
                })
                .collect(),
            checklists: checklists_by_trip.remove(&trip_id).unwrap_or_default(),
            entity_links: entity_links
                .remove(&trip_id)
                .unwrap_or_default()
                .into_iter()
                .map(|e| EntityLinkSnapshot {
                    source_type: e.source_type,
                    source_name: e.source_name,
                    target_type: e.target_type,
                    target_name: e.target_name,
                    note: e.note,
                })
                .collect(),
        });
    }

    Ok(snapshots)
}

async fn export_trip_checklists(
    client: &impl deadpool_postgres::GenericClient,
    trip_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<ChecklistSnapshot>>> {
    let lists = collections_repo::list_checklists_for_trips(client, trip_ids).await?;
    let list_ids: Vec<Uuid> = lists.iter().map(|c| c.id).collect();
    let mut items_by_list = group_by(
        collections_repo::list_checklist_items(client, &list_ids).await?,
        |item| item.checklist_id,
    );

    let mut result: HashMap<Uuid, Vec<ChecklistSnapshot>> = HashMap::new();
    for list in lists {
        let Some(trip_id) = list.trip_id else {
            continue;
        };
        let items = items_by_list
            .remove(&list.id)
            .unwrap_or_default()
            .into_iter()
            .map(|item| ChecklistItemSnapshot {
                text: item.text,
                is_done: item.is_done,
                sort_order: item.sort_order,
            })
            .collect();
        result.entry(trip_id).or_default().push(ChecklistSnapshot {
            name: list.name,
            items,
        });
    }
    Ok(result)
}

fn group_by<T, F: Fn(&T) -> Uuid>(items: Vec<T>, key: F) -> HashMap<Uuid, Vec<T>> {
    let mut grouped: HashMap<Uuid, Vec<T>> = HashMap::new();
    for item in items {
        grouped.entry(key(&item)).or_default().push(item);
    }
    grouped
}

fn group_pairs(pairs: Vec<(Uuid, String)>) -> HashMap<Uuid, Vec<String>> {
    let mut grouped: HashMap<Uuid, Vec<String>> = HashMap::new();
    for (id, value) in pairs {
        grouped.entry(id).or_default().push(value);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_is_bounded() {
        // Export must never hydrate the whole account in one query round.
        assert!(TRIP_BATCH_SIZE >= 1 && TRIP_BATCH_SIZE <= 100);
    }

    #[test]
    fn group_by_preserves_per_key_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let items = vec![(a, 1), (b, 2), (a, 3)];
        let grouped = group_by(items, |(id, _)| *id);
        assert_eq!(grouped[&a], vec![(a, 1), (a, 3)]);
        assert_eq!(grouped[&b], vec![(b, 2)]);
    }
}
