use deadpool_postgres::GenericClient;
use tokio_postgres::Row;
use uuid::Uuid;
use crate::{
    backup::document::{
        ActivitySnapshot, EntityLinkSnapshot, FlightTrackingSnapshot, JournalEntrySnapshot,
        LocationSnapshot, LodgingSnapshot, PhotoAlbumSnapshot, PhotoSnapshot,
        TransportationSnapshot, TripSnapshot, WeatherSnapshot,
    },
    error::Result,
    models::trip::{
        Activity, EntityLink, FlightTracking, JournalEntry, Location, Lodging, PhotoAlbum,
        PhotoAssignment, Transportation, Trip, WeatherRecord,
    },
};

fn row_to_trip(row: &Row) -> Result<Trip> {
    Ok(Trip {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        series_id: row.try_get("series_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        destination: row.try_get("destination")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Lists the IDs of every trip owned by a user, oldest first. Export loads
/// these up front and then batch-loads the trip graph.
pub async fn list_trip_ids(client: &impl GenericClient, user_id: &Uuid) -> Result<Vec<Uuid>> {
    let rows = client
        .query(
            "SELECT id FROM trips WHERE user_id = $1 ORDER BY created_at",
            &[user_id],
        )
        .await?;
    Ok(rows.iter().map(|r| r.get("id")).collect())
}

/// Loads the trips with the given IDs.
pub async fn load_trips(client: &impl GenericClient, trip_ids: &[Uuid]) -> Result<Vec<Trip>> {
    let ids = trip_ids.to_vec();
    let rows = client
        .query(
            r#"
            SELECT id, user_id, series_id, name, description, destination,
                   start_date, end_date, created_at, updated_at
            FROM trips
            WHERE id = ANY($1)
            ORDER BY created_at
            "#,
            &[&ids],
        )
        .await?;
    rows.iter().map(row_to_trip).collect()
}

/// Loads the locations of the given trips.
pub async fn load_locations(
    client: &impl GenericClient,
    trip_ids: &[Uuid],
) -> Result<Vec<Location>> {
    let ids = trip_ids.to_vec();
    let rows = client
        .query(
            r#"
            SELECT l.id, l.trip_id, l.name, l.address, l.latitude, l.longitude,
                   c.name AS category, l.arrival_date, l.departure_date, l.notes, l.sort_order
            FROM locations l
            LEFT JOIN location_categories c ON c.id = l.category_id
            WHERE l.trip_id = ANY($1)
            ORDER BY l.sort_order
            "#,
            &[&ids],
        )
        .await?;
    rows.iter()
        .map(|row| {
            Ok(Location {
                id: row.try_get("id")?,
                trip_id: row.try_get("trip_id")?,
                name: row.try_get("name")?,
                address: row.try_get("address")?,
                latitude: row.try_get("latitude")?,
                longitude: row.try_get("longitude")?,
                category: row.try_get("category")?,
                arrival_date: row.try_get("arrival_date")?,
                departure_date: row.try_get("departure_date")?,
                notes: row.try_get("notes")?,
                sort_order: row.try_get("sort_order")?,
            })
        })
        .collect()
}

/// Loads the activities of the given trips, with their location's name.
pub async fn load_activities(
    client: &impl GenericClient,
    trip_ids: &[Uuid],
) -> Result<Vec<Activity>> {
    let ids = trip_ids.to_vec();
    let rows = client
        .query(
            r#"
            SELECT a.id, a.trip_id, l.name AS location_name, a.name, a.scheduled_at,
                   a.duration_minutes, a.cost, a.currency, a.notes
            FROM activities a
            LEFT JOIN locations l ON l.id = a.location_id
            WHERE a.trip_id = ANY($1)
            ORDER BY a.scheduled_at NULLS LAST
            "#,
            &[&ids],
        )
        .await?;
    rows.iter()
        .map(|row| {
            Ok(Activity {
                id: row.try_get("id")?,
                trip_id: row.try_get("trip_id")?,
                location_name: row.try_get("location_name")?,
                name: row.try_get("name")?,
                scheduled_at: row.try_get("scheduled_at")?,
                duration_minutes: row.try_get("duration_minutes")?,
                cost: row.try_get("cost")?,
                currency: row.try_get("currency")?,
                notes: row.try_get("notes")?,
            })
        })
        .collect()
}

/// Loads the transportation legs of the given trips, including nested
/// flight-tracking rows for flight legs.
pub async fn load_transportation(
    client: &impl GenericClient,
    trip_ids: &[Uuid],
) -> Result<Vec<Transportation>> {
    let ids = trip_ids.to_vec();
    let rows = client
        .query(
            r#"
            SELECT t.id, t.trip_id, t.mode, t.carrier, t.departure_place, t.departure_time,
                   t.arrival_place, t.arrival_time, t.confirmation_number,
                   f.flight_number, f.airline_code, f.departure_airport, f.arrival_airport, f.status
            FROM transportation t
            LEFT JOIN flight_tracking f ON f.transportation_id = t.id
            WHERE t.trip_id = ANY($1)
            ORDER BY t.departure_time NULLS LAST
            "#,
            &[&ids],
        )
        .await?;
    rows.iter()
        .map(|row| {
            let flight_number: Option<String> = row.try_get("flight_number")?;
            let flight = flight_number.map(|number| -> Result<FlightTracking> {
                Ok(FlightTracking {
                    flight_number: number,
                    airline_code: row.try_get("airline_code")?,
                    departure_airport: row.try_get("departure_airport")?,
                    arrival_airport: row.try_get("arrival_airport")?,
                    status: row.try_get("status")?,
                })
            });
            Ok(Transportation {
                id: row.try_get("id")?,
                trip_id: row.try_get("trip_id")?,
                mode: row.try_get("mode")?,
                carrier: row.try_get("carrier")?,
                departure_place: row.try_get("departure_place")?,
                departure_time: row.try_get("departure_time")?,
                arrival_place: row.try_get("arrival_place")?,
                arrival_time: row.try_get("arrival_time")?,
                confirmation_number: row.try_get("confirmation_number")?,
                flight: flight.transpose()?,
            })
        })
        .collect()
}

/// Loads the lodging stays of the given trips.
pub async fn load_lodging(client: &impl GenericClient, trip_ids: &[Uuid]) -> Result<Vec<Lodging>> {
    let ids = trip_ids.to_vec();
    let rows = client
        .query(
            r#"
            SELECT id, trip_id, name, address, check_in, check_out,
                   confirmation_number, cost, currency
            FROM lodging
            WHERE trip_id = ANY($1)
            ORDER BY check_in NULLS LAST
            "#,
            &[&ids],
        )
        .await?;
    rows.iter()
        .map(|row| {
            Ok(Lodging {
                id: row.try_get("id")?,
                trip_id: row.try_get("trip_id")?,
                name: row.try_get("name")?,
                address: row.try_get("address")?,
                check_in: row.try_get("check_in")?,
                check_out: row.try_get("check_out")?,
                confirmation_number: row.try_get("confirmation_number")?,
                cost: row.try_get("cost")?,
                currency: row.try_get("currency")?,
            })
        })
        .collect()
}

/// Loads the journal entries of the given trips.
pub async fn load_journal_entries(
    client: &impl GenericClient,
    trip_ids: &[Uuid],
) -> Result<Vec<JournalEntry>> {
    let ids = trip_ids.to_vec();
    let rows = client
        .query(
            r#"
            SELECT id, trip_id, title, body, entry_date, mood
            FROM journal_entries
            WHERE trip_id = ANY($1)
            ORDER BY entry_date
            "#,
            &[&ids],
        )
        .await?;
    rows.iter()
        .map(|row| {
            Ok(JournalEntry {
                id: row.try_get("id")?,
                trip_id: row.try_get("trip_id")?,
                title: row.try_get("title")?,
                body: row.try_get("body")?,
                entry_date: row.try_get("entry_date")?,
                mood: row.try_get("mood")?,
            })
        })
        .collect()
}

/// Loads the photo albums of the given trips.
pub async fn load_photo_albums(
    client: &impl GenericClient,
    trip_ids: &[Uuid],
) -> Result<Vec<PhotoAlbum>> {
    let ids = trip_ids.to_vec();
    let rows = client
        .query(
            "SELECT id, trip_id, name, description FROM photo_albums WHERE trip_id = ANY($1) ORDER BY name",
            &[&ids],
        )
        .await?;
    rows.iter()
        .map(|row| {
            Ok(PhotoAlbum {
                id: row.try_get("id")?,
                trip_id: row.try_get("trip_id")?,
                name: row.try_get("name")?,
                description: row.try_get("description")?,
            })
        })
        .collect()
}

/// Loads the photo metadata rows of the given albums.
pub async fn load_photos(
    client: &impl GenericClient,
    album_ids: &[Uuid],
) -> Result<Vec<PhotoAssignment>> {
    let ids = album_ids.to_vec();
    let rows = client
        .query(
            r#"
            SELECT id, album_id, file_name, caption, taken_at, latitude, longitude, sort_order
            FROM photos
            WHERE album_id = ANY($1)
            ORDER BY sort_order
            "#,
            &[&ids],
        )
        .await?;
    rows.iter()
        .map(|row| {
            Ok(PhotoAssignment {
                id: row.try_get("id")?,
                album_id: row.try_get("album_id")?,
                file_name: row.try_get("file_name")?,
                caption: row.try_get("caption")?,
                taken_at: row.try_get("taken_at")?,
                latitude: row.try_get("latitude")?,
                longitude: row.try_get("longitude")?,
                sort_order: row.try_get("sort_order")?,
            })
        })
        .collect()
}

/// Loads the cached weather rows of the given trips.
pub async fn load_weather(
    client: &impl GenericClient,
    trip_ids: &[Uuid],
) -> Result<Vec<WeatherRecord>> {
    let ids = trip_ids.to_vec();
    let rows = client
        .query(
            r#"
            SELECT id, trip_id, recorded_on, temperature_high, temperature_low, conditions
            FROM trip_weather
            WHERE trip_id = ANY($1)
            ORDER BY recorded_on
            "#,
            &[&ids],
        )
        .await?;
    rows.iter()
        .map(|row| {
            Ok(WeatherRecord {
                id: row.try_get("id")?,
                trip_id: row.try_get("trip_id")?,
                recorded_on: row.try_get("recorded_on")?,
                temperature_high: row.try_get("temperature_high")?,
                temperature_low: row.try_get("temperature_low")?,
                conditions: row.try_get("conditions")?,
            })
        })
        .collect()
}

/// Loads the entity links of the given trips.
pub async fn load_entity_links(
    client: &impl GenericClient,
    trip_ids: &[Uuid],
) -> Result<Vec<EntityLink>> {
    let ids = trip_ids.to_vec();
    let rows = client
        .query(
            r#"
            SELECT id, trip_id, source_type, source_name, target_type, target_name, note
            FROM entity_links
            WHERE trip_id = ANY($1)
            "#,
            &[&ids],
        )
        .await?;
    rows.iter()
        .map(|row| {
            Ok(EntityLink {
                id: row.try_get("id")?,
                trip_id: row.try_get("trip_id")?,
                source_type: row.try_get("source_type")?,
                source_name: row.try_get("source_name")?,
                target_type: row.try_get("target_type")?,
                target_name: row.try_get("target_name")?,
                note: row.try_get("note")?,
            })
        })
        .collect()
}

/// Loads tag names per trip. Names, not IDs: tag assignments are exported
/// as name references.
pub async fn load_trip_tag_names(
    client: &impl GenericClient,
    trip_ids: &[Uuid],
) -> Result<Vec<(Uuid, String)>> {
    let ids = trip_ids.to_vec();
    let rows = client
        .query(
            r#"
            SELECT tt.trip_id, t.name
            FROM trip_tags tt
            JOIN tags t ON t.id = tt.tag_id
            WHERE tt.trip_id = ANY($1)
            ORDER BY t.name
            "#,
            &[&ids],
        )
        .await?;
    Ok(rows.iter().map(|r| (r.get("trip_id"), r.get("name"))).collect())
}

/// Loads companion names per trip.
pub async fn load_trip_companion_names(
    client: &impl GenericClient,
    trip_ids: &[Uuid],
) -> Result<Vec<(Uuid, String)>> {
    let ids = trip_ids.to_vec();
    let rows = client
        .query(
            r#"
            SELECT tc.trip_id, c.name
            FROM trip_companions tc
            JOIN companions c ON c.id = tc.companion_id
            WHERE tc.trip_id = ANY($1)
            ORDER BY c.name
            "#,
            &[&ids],
        )
        .await?;
    Ok(rows.iter().map(|r| (r.get("trip_id"), r.get("name"))).collect())
}

/// Loads language codes per trip.
pub async fn load_trip_languages(
    client: &impl GenericClient,
    trip_ids: &[Uuid],
) -> Result<Vec<(Uuid, String)>> {
    let ids = trip_ids.to_vec();
    let rows = client
        .query(
            "SELECT trip_id, language_code FROM trip_languages WHERE trip_id = ANY($1) ORDER BY language_code",
            &[&ids],
        )
        .await?;
    Ok(rows
        .iter()
        .map(|r| (r.get("trip_id"), r.get("language_code")))
        .collect())
}

/// Deletes every trip owned by a user. Child rows cascade.
pub async fn delete_all_trips(client: &impl GenericClient, user_id: &Uuid) -> Result<u64> {
    Ok(client
        .execute("DELETE FROM trips WHERE user_id = $1", &[user_id])
        .await?)
}

/// Inserts a trip from a snapshot, returning the new trip ID.
pub async fn insert_trip(
    client: &impl GenericClient,
    user_id: &Uuid,
    series_id: Option<&Uuid>,
    snapshot: &TripSnapshot,
) -> Result<Uuid> {
    let trip_id = Uuid::new_v4();
    client
        .execute(
            r#"
            INSERT INTO trips (id, user_id, series_id, name, description, destination, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
            &[
                &trip_id,
                user_id,
                &series_id,
                &snapshot.name,
                &snapshot.description,
                &snapshot.destination,
                &snapshot.start_date,
                &snapshot.end_date,
            ],
        )
        .await?;
    Ok(trip_id)
}

/// Inserts a location from a snapshot, returning the new location ID.
pub async fn insert_location(
    client: &impl GenericClient,
    trip_id: &Uuid,
    category_id: Option<&Uuid>,
    snapshot: &LocationSnapshot,
) -> Result<Uuid> {
    let location_id = Uuid::new_v4();
    client
        .execute(
            r#"
            INSERT INTO locations (id, trip_id, name, address, latitude, longitude,
                                   category_id, arrival_date, departure_date, notes, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
            &[
                &location_id,
                trip_id,
                &snapshot.name,
                &snapshot.address,
                &snapshot.latitude,
                &snapshot.longitude,
                &category_id,
                &snapshot.arrival_date,
                &snapshot.departure_date,
                &snapshot.notes,
                &snapshot.sort_order,
            ],
        )
        .await?;
    Ok(location_id)
}

/// Inserts an activity from a snapshot.
pub async fn insert_activity(
    client: &impl GenericClient,
    trip_id: &Uuid,
    location_id: Option<&Uuid>,
    snapshot: &ActivitySnapshot,
) -> Result<()> {
    client
        .execute(
            r#"
            INSERT INTO activities (id, trip_id, location_id, name, scheduled_at,
                                    duration_minutes, cost, currency, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
            &[
                &Uuid::new_v4(),
                trip_id,
                &location_id,
                &snapshot.name,
                &snapshot.scheduled_at,
                &snapshot.duration_minutes,
                &snapshot.cost,
                &snapshot.currency,
                &snapshot.notes,
            ],
        )
        .await?;
    Ok(())
}

/// Inserts a transportation leg and, for flights, its tracking row.
pub async fn insert_transportation(
    client: &impl GenericClient,
    trip_id: &Uuid,
    snapshot: &TransportationSnapshot,
) -> Result<()> {
    let transportation_id = Uuid::new_v4();
    client
        .execute(
            r#"
            INSERT INTO transportation (id, trip_id, mode, carrier, departure_place,
                                        departure_time, arrival_place, arrival_time, confirmation_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
            &[
                &transportation_id,
                trip_id,
                &snapshot.mode,
                &snapshot.carrier,
                &snapshot.departure_place,
                &snapshot.departure_time,
                &snapshot.arrival_place,
                &snapshot.arrival_time,
                &snapshot.confirmation_number,
            ],
        )
        .await?;

    if let Some(flight) = &snapshot.flight {
        insert_flight_tracking(client, &transportation_id, flight).await?;
    }

    Ok(())
}

async fn insert_flight_tracking(
    client: &impl GenericClient,
    transportation_id: &Uuid,
    snapshot: &FlightTrackingSnapshot,
) -> Result<()> {
    client
        .execute(
            r#"
            INSERT INTO flight_tracking (id, transportation_id, flight_number, airline_code,
                                         departure_airport, arrival_airport, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
            &[
                &Uuid::new_v4(),
                transportation_id,
                &snapshot.flight_number,
                &snapshot.airline_code,
                &snapshot.departure_airport,
                &snapshot.arrival_airport,
                &snapshot.status,
            ],
        )
        .await?;
    Ok(())
}

/// Inserts a lodging stay from a snapshot.
pub async fn insert_lodging(
    client: &impl GenericClient,
    trip_id: &Uuid,
    snapshot: &LodgingSnapshot,
) -> Result<()> {
    client
        .execute(
            r#"
            INSERT INTO lodging (id, trip_id, name, address, check_in, check_out,
                                 confirmation_number, cost, currency)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
            &[
                &Uuid::new_v4(),
                trip_id,
                &snapshot.name,
                &snapshot.address,
                &snapshot.check_in,
                &snapshot.check_out,
                &snapshot.confirmation_number,
                &snapshot.cost,
                &snapshot.currency,
            ],
        )
        .await?;
    Ok(())
}

/// Inserts a journal entry from a snapshot.
pub async fn insert_journal_entry(
    client: &impl GenericClient,
    trip_id: &Uuid,
    snapshot: &JournalEntrySnapshot,
) -> Result<()> {
    client
        .execute(
            r#"
            INSERT INTO journal_entries (id, trip_id, title, body, entry_date, mood)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
            &[
                &Uuid::new_v4(),
                trip_id,
                &snapshot.title,
                &snapshot.body,
                &snapshot.entry_date,
                &snapshot.mood,
            ],
        )
        .await?;
    Ok(())
}

/// Inserts a photo album from a snapshot, returning the new album ID.
pub async fn insert_photo_album(
    client: &impl GenericClient,
    trip_id: &Uuid,
    snapshot: &PhotoAlbumSnapshot,
) -> Result<Uuid> {
    let album_id = Uuid::new_v4();
    client
        .execute(
            "INSERT INTO photo_albums (id, trip_id, name, description) VALUES ($1, $2, $3, $4)",
            &[&album_id, trip_id, &snapshot.name, &snapshot.description],
        )
        .await?;
    Ok(album_id)
}

/// Inserts a photo metadata row from a snapshot.
pub async fn insert_photo(
    client: &impl GenericClient,
    album_id: &Uuid,
    snapshot: &PhotoSnapshot,
) -> Result<()> {
    client
        .execute(
            r#"
            INSERT INTO photos (id, album_id, file_name, caption, taken_at, latitude, longitude, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
            &[
                &Uuid::new_v4(),
                album_id,
                &snapshot.file_name,
                &snapshot.caption,
                &snapshot.taken_at,
                &snapshot.latitude,
                &snapshot.longitude,
                &snapshot.sort_order,
            ],
        )
        .await?;
    Ok(())
}

/// Inserts a cached weather row from a snapshot.
pub async fn insert_weather(
    client: &impl GenericClient,
    trip_id: &Uuid,
    snapshot: &WeatherSnapshot,
) -> Result<()> {
    client
        .execute(
            r#"
            INSERT INTO trip_weather (id, trip_id, recorded_on, temperature_high, temperature_low, conditions)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
            &[
                &Uuid::new_v4(),
                trip_id,
                &snapshot.recorded_on,
                &snapshot.temperature_high,
                &snapshot.temperature_low,
                &snapshot.conditions,
            ],
        )
        .await?;
    Ok(())
}

/// Inserts an entity link from a snapshot.
pub async fn insert_entity_link(
    client: &impl GenericClient,
    trip_id: &Uuid,
    snapshot: &EntityLinkSnapshot,
) -> Result<()> {
    client
        .execute(
            r#"
            INSERT INTO entity_links (id, trip_id, source_type, source_name, target_type, target_name, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
            &[
                &Uuid::new_v4(),
                trip_id,
                &snapshot.source_type,
                &snapshot.source_name,
                &snapshot.target_type,
                &snapshot.target_name,
                &snapshot.note,
            ],
        )
        .await?;
    Ok(())
}

/// Links a trip to a tag.
pub async fn link_trip_tag(
    client: &impl GenericClient,
    trip_id: &Uuid,
    tag_id: &Uuid,
) -> Result<()> {
    client
        .execute(
            "INSERT INTO trip_tags (trip_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            &[trip_id, tag_id],
        )
        .await?;
    Ok(())
}

/// Links a trip to a companion.
pub async fn link_trip_companion(
    client: &impl GenericClient,
    trip_id: &Uuid,
    companion_id: &Uuid,
) -> Result<()> {
    client
        .execute(
            "INSERT INTO trip_companions (trip_id, companion_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            &[trip_id, companion_id],
        )
        .await?;
    Ok(())
}

/// Records a language spoken on a trip.
pub async fn insert_trip_language(
    client: &impl GenericClient,
    trip_id: &Uuid,
    language_code: &str,
) -> Result<()> {
    client
        .execute(
            "INSERT INTO trip_languages (trip_id, language_code) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            &[trip_id, &language_code],
        )
        .await?;
    Ok(())
}
