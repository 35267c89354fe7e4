use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A user-defined tag, assignable to trips by name.
#[derive(Clone, Debug)]
pub struct Tag {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub color: Option<String>,
}

/// A travel companion the user records trips with.
#[derive(Clone, Debug)]
pub struct Companion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub notes: Option<String>,
}

/// A user-defined category for trip locations.
#[derive(Clone, Debug)]
pub struct LocationCategory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub icon: Option<String>,
}

/// A checklist, either global (`trip_id` unset) or attached to a trip.
#[derive(Clone, Debug)]
pub struct Checklist {
    pub id: Uuid,
    pub user_id: Uuid,
    pub trip_id: Option<Uuid>,
    pub name: String,
}

/// A single item on a checklist.
#[derive(Clone, Debug)]
pub struct ChecklistItem {
    pub id: Uuid,
    pub checklist_id: Uuid,
    pub text: String,
    pub is_done: bool,
    pub sort_order: i32,
}

/// A named series grouping related trips (e.g. "Interrail 2024").
#[derive(Clone, Debug)]
pub struct TripSeries {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
