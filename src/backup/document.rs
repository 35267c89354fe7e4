use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: &str = "1.2.0";

/// The only signature algorithm this build produces or accepts.
pub const INTEGRITY_ALGORITHM: &str = "hmac-sha256";

/// The versioned envelope representing a full account export.
///
/// The `integrity` block is computed over every other field and is omitted
/// from serialization while signing, so struct field order here *is* the
/// canonical serialization order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub user: UserProfileSnapshot,
    #[serde(default)]
    pub tags: Vec<TagSnapshot>,
    #[serde(default)]
    pub companions: Vec<CompanionSnapshot>,
    #[serde(default)]
    pub location_categories: Vec<LocationCategorySnapshot>,
    #[serde(default)]
    pub checklists: Vec<ChecklistSnapshot>,
    #[serde(default)]
    pub travel_documents: Vec<TravelDocumentSnapshot>,
    #[serde(default)]
    pub trip_series: Vec<TripSeriesSnapshot>,
    #[serde(default)]
    pub trips: Vec<TripSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<IntegrityBlock>,
}

/// The signature block attached to a signed backup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityBlock {
    pub algorithm: String,
    /// Hex-encoded HMAC-SHA256 over the canonical document bytes.
    pub signature: String,
}

/// The user's profile and settings as exported.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileSnapshot {
    pub email: String,
    pub display_name: String,
    pub timezone: Option<String>,
    pub home_currency: Option<String>,
    pub distance_unit: Option<String>,
    pub weather_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSnapshot {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionSnapshot {
    pub name: String,
    pub email: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCategorySnapshot {
    pub name: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistSnapshot {
    pub name: String,
    #[serde(default)]
    pub items: Vec<ChecklistItemSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItemSnapshot {
    pub text: String,
    #[serde(default)]
    pub is_done: bool,
    #[serde(default)]
    pub sort_order: i32,
}

/// A travel document as exported. The number is already masked at export
/// time; full numbers are never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelDocumentSnapshot {
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

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSeriesSnapshot {
    pub name: String,
    pub description: Option<String>,
}

/// A trip plus everything it owns. Tags, companions and the series are
/// referenced by name because database IDs are not stable across restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSnapshot {
    pub name: String,
    pub description: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub companions: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub locations: Vec<LocationSnapshot>,
    #[serde(default)]
    pub activities: Vec<ActivitySnapshot>,
    #[serde(default)]
    pub transportation: Vec<TransportationSnapshot>,
    #[serde(default)]
    pub lodging: Vec<LodgingSnapshot>,
    #[serde(default)]
    pub journal_entries: Vec<JournalEntrySnapshot>,
    #[serde(default)]
    pub photo_albums: Vec<PhotoAlbumSnapshot>,
    #[serde(default)]
    pub weather: Vec<WeatherSnapshot>,
    #[serde(default)]
    pub checklists: Vec<ChecklistSnapshot>,
    #[serde(default)]
    pub entity_links: Vec<EntityLinkSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSnapshot {
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub category: Option<String>,
    pub arrival_date: Option<NaiveDate>,
    pub departure_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySnapshot {
    pub name: String,
    pub location: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub cost: Option<f64>,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportationSnapshot {
    pub mode: String,
    pub carrier: Option<String>,
    pub departure_place: Option<String>,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_place: Option<String>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub confirmation_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight: Option<FlightTrackingSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightTrackingSnapshot {
    pub flight_number: String,
    pub airline_code: Option<String>,
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LodgingSnapshot {
    pub name: String,
    pub address: Option<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub confirmation_number: Option<String>,
    pub cost: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntrySnapshot {
    pub title: Option<String>,
    pub body: String,
    pub entry_date: NaiveDate,
    pub mood: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoAlbumSnapshot {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub photos: Vec<PhotoSnapshot>,
}

/// Photo metadata only; the binary file is never part of a backup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoSnapshot {
    pub file_name: String,
    pub caption: Option<String>,
    pub taken_at: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub recorded_on: NaiveDate,
    pub temperature_high: Option<f64>,
    pub temperature_low: Option<f64>,
    pub conditions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityLinkSnapshot {
    pub source_type: String,
    pub source_name: String,
    pub target_type: String,
    pub target_name: String,
    pub note: Option<String>,
}

/// Recognized backup schema versions.
///
/// Restore dispatches over this enum rather than string-matching inline, so
/// each backward-compatibility quirk stays in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    /// Pre-series format: no trip series, no entity links, no integrity block.
    V1_0,
    /// Adds trip series.
    V1_1,
    /// Adds entity links and the integrity block.
    V1_2,
}

impl SchemaVersion {
    /// Parses a semantic version string into a recognized schema version.
    /// The patch component is ignored.
    pub fn parse(version: &str) -> Option<Self> {
        let mut parts = version.split('.');
        let major = parts.next()?.parse::<u32>().ok()?;
        let minor = parts.next()?.parse::<u32>().ok()?;
        match (major, minor) {
            (1, 0) => Some(SchemaVersion::V1_0),
            (1, 1) => Some(SchemaVersion::V1_1),
            (1, 2) => Some(SchemaVersion::V1_2),
            _ => None,
        }
    }

    /// Normalizes a parsed document to the current schema, clearing any
    /// collections the declared version cannot legitimately carry.
    pub fn normalize(self, mut document: BackupDocument) -> BackupDocument {
        match self {
            SchemaVersion::V1_0 => {
                document.trip_series.clear();
                for trip in &mut document.trips {
                    trip.series = None;
                    trip.entity_links.clear();
                }
                document
            }
            SchemaVersion::V1_1 => {
                for trip in &mut document.trips {
                    trip.entity_links.clear();
                }
                document
            }
            SchemaVersion::V1_2 => document,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_document(version: &str) -> BackupDocument {
        BackupDocument {
            version: version.to_string(),
            export_date: Utc::now(),
            user: UserProfileSnapshot {
                email: "ada@example.com".to_string(),
                display_name: "Ada".to_string(),
                timezone: None,
                home_currency: None,
                distance_unit: None,
                weather_api_key: None,
            },
            tags: vec![],
            companions: vec![],
            location_categories: vec![],
            checklists: vec![],
            travel_documents: vec![],
            trip_series: vec![TripSeriesSnapshot {
                name: "Interrail".to_string(),
                description: None,
            }],
            trips: vec![TripSnapshot {
                name: "Lisbon".to_string(),
                description: None,
                destination: None,
                start_date: None,
                end_date: None,
                series: Some("Interrail".to_string()),
                tags: vec![],
                companions: vec![],
                languages: vec![],
                locations: vec![],
                activities: vec![],
                transportation: vec![],
                lodging: vec![],
                journal_entries: vec![],
                photo_albums: vec![],
                weather: vec![],
                checklists: vec![],
                entity_links: vec![EntityLinkSnapshot {
                    source_type: "activity".to_string(),
                    source_name: "Tram 28".to_string(),
                    target_type: "location".to_string(),
                    target_name: "Alfama".to_string(),
                    note: None,
                }],
            }],
            integrity: None,
        }
    }

    #[test]
    fn recognizes_supported_versions() {
        assert_eq!(SchemaVersion::parse("1.0.0"), Some(SchemaVersion::V1_0));
        assert_eq!(SchemaVersion::parse("1.1.3"), Some(SchemaVersion::V1_1));
        assert_eq!(SchemaVersion::parse("1.2.0"), Some(SchemaVersion::V1_2));
        assert_eq!(
            SchemaVersion::parse(CURRENT_SCHEMA_VERSION),
            Some(SchemaVersion::V1_2)
        );
    }

    #[test]
    fn rejects_unknown_versions() {
        assert_eq!(SchemaVersion::parse("2.0.0"), None);
        assert_eq!(SchemaVersion::parse("1.7.0"), None);
        assert_eq!(SchemaVersion::parse("banana"), None);
        assert_eq!(SchemaVersion::parse(""), None);
    }

    #[test]
    fn v1_0_normalization_drops_series_and_links() {
        let doc = SchemaVersion::V1_0.normalize(minimal_document("1.0.0"));
        assert!(doc.trip_series.is_empty());
        assert!(doc.trips[0].series.is_none());
        assert!(doc.trips[0].entity_links.is_empty());
    }

    #[test]
    fn v1_1_normalization_keeps_series_but_drops_links() {
        let doc = SchemaVersion::V1_1.normalize(minimal_document("1.1.0"));
        assert_eq!(doc.trip_series.len(), 1);
        assert_eq!(doc.trips[0].series.as_deref(), Some("Interrail"));
        assert!(doc.trips[0].entity_links.is_empty());
    }

    #[test]
    fn v1_2_normalization_is_identity() {
        let doc = SchemaVersion::V1_2.normalize(minimal_document("1.2.0"));
        assert_eq!(doc.trips[0].entity_links.len(), 1);
    }

    #[test]
    fn integrity_block_is_omitted_from_serialization_when_absent() {
        let doc = minimal_document("1.2.0");
        let json = sonic_rs::to_string(&doc).unwrap();
        assert!(!json.contains("integrity"));
        assert!(json.contains("exportDate"));
        assert!(json.contains("tripSeries"));
    }

    #[test]
    fn deserializes_sparse_legacy_documents() {
        // A 1.0 backup carries none of the newer collections.
        let json = serde_json::json!({
            "version": "1.0.0",
            "exportDate": "2024-05-01T00:00:00Z",
            "user": { "email": "ada@example.com", "displayName": "Ada" },
        })
        .to_string();

        let doc: BackupDocument = sonic_rs::from_str(&json).unwrap();
        assert!(doc.trips.is_empty());
        assert!(doc.integrity.is_none());
    }
}
