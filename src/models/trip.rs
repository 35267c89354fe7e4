use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// A trip, the root of a user's travel-journal data graph.
#[derive(Clone, Debug)]
pub struct Trip {
    pub id: Uuid,
    pub user_id: Uuid,
    pub series_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A place visited (or planned) within a trip.
#[derive(Clone, Debug)]
pub struct Location {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Category by name; resolved against the user's location categories.
    pub category: Option<String>,
    pub arrival_date: Option<NaiveDate>,
    pub departure_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub sort_order: i32,
}

/// A scheduled activity within a trip.
#[derive(Clone, Debug)]
pub struct Activity {
    pub id: Uuid,
    pub trip_id: Uuid,
    /// Location by name within the same trip, if any.
    pub location_name: Option<String>,
    pub name: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub cost: Option<f64>,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

/// A transportation leg of a trip.
#[derive(Clone, Debug)]
pub struct Transportation {
    pub id: Uuid,
    pub trip_id: Uuid,
    /// Mode of travel, e.g. "FLIGHT", "TRAIN", "FERRY".
    pub mode: String,
    pub carrier: Option<String>,
    pub departure_place: Option<String>,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_place: Option<String>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub confirmation_number: Option<String>,
    pub flight: Option<FlightTracking>,
}

/// Flight-tracking details nested under a `FLIGHT` transportation leg.
#[derive(Clone, Debug)]
pub struct FlightTracking {
    pub flight_number: String,
    pub airline_code: Option<String>,
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub status: Option<String>,
}

/// A lodging stay within a trip.
#[derive(Clone, Debug)]
pub struct Lodging {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub confirmation_number: Option<String>,
    pub cost: Option<f64>,
    pub currency: Option<String>,
}

/// A journal entry written during a trip.
#[derive(Clone, Debug)]
pub struct JournalEntry {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub title: Option<String>,
    pub body: String,
    pub entry_date: NaiveDate,
    pub mood: Option<String>,
}

/// A photo album belonging to a trip. Only metadata lives here; the binary
/// files are stored elsewhere and are never part of a backup.
#[derive(Clone, Debug)]
pub struct PhotoAlbum {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// A photo's metadata row within an album.
#[derive(Clone, Debug)]
pub struct PhotoAssignment {
    pub id: Uuid,
    pub album_id: Uuid,
    pub file_name: String,
    pub caption: Option<String>,
    pub taken_at: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub sort_order: i32,
}

/// A cached weather observation for a trip day.
#[derive(Clone, Debug)]
pub struct WeatherRecord {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub recorded_on: NaiveDate,
    pub temperature_high: Option<f64>,
    pub temperature_low: Option<f64>,
    pub conditions: Option<String>,
}

/// A free-form link between two entities of a trip, by name reference.
/// Database IDs are not stable across restore, so links are kept symbolic.
#[derive(Clone, Debug)]
pub struct EntityLink {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub source_type: String,
    pub source_name: String,
    pub target_type: String,
    pub target_name: String,
    pub note: Option<String>,
}
