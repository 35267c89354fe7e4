use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A travel document (passport, visa, insurance, ...) owned by a user.
///
/// At most one document per `(user_id, doc_type)` may have `is_primary` set;
/// the service layer enforces this by unsetting siblings in the same
/// transaction as any write that sets it.
#[derive(Clone, Debug)]
pub struct TravelDocument {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Document kind, e.g. "PASSPORT", "VISA", "INSURANCE".
    pub doc_type: String,
    pub name: String,
    pub issuing_country: Option<String>,
    /// The full document number. Never serialized: every read path goes
    /// through [`mask_document_number`].
    pub document_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_primary: bool,
    /// Days before expiry at which the user wants to be alerted.
    pub alert_days_before: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// API-facing projection of a travel document with the number masked.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelDocumentView {
    pub id: Uuid,
    pub doc_type: String,
    pub name: String,
    pub issuing_country: Option<String>,
    pub document_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_primary: bool,
    pub alert_days_before: Option<i32>,
}

impl From<TravelDocument> for TravelDocumentView {
    fn from(doc: TravelDocument) -> Self {
        Self {
            id: doc.id,
            doc_type: doc.doc_type,
            name: doc.name,
            issuing_country: doc.issuing_country,
            document_number: doc.document_number.as_deref().map(mask_document_number),
            issue_date: doc.issue_date,
            expiry_date: doc.expiry_date,
            notes: doc.notes,
            is_primary: doc.is_primary,
            alert_days_before: doc.alert_days_before,
        }
    }
}

/// Masks a document number to a fixed `***` prefix plus its last 4 characters.
///
/// Full numbers never leave the server: both the read API and backup export
/// run numbers through this.
pub fn mask_document_number(number: &str) -> String {
    let chars: Vec<char> = number.chars().collect();
    let tail: String = if chars.len() > 4 {
        chars[chars.len() - 4..].iter().collect()
    } else {
        chars.iter().collect()
    };
    format!("***{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_all_but_last_four() {
        assert_eq!(mask_document_number("AB1234567"), "***4567");
    }

    #[test]
    fn short_numbers_keep_their_tail() {
        assert_eq!(mask_document_number("123"), "***123");
        assert_eq!(mask_document_number("1234"), "***1234");
    }

    #[test]
    fn empty_number_is_just_the_prefix() {
        assert_eq!(mask_document_number(""), "***");
    }

    #[test]
    fn view_masks_the_number() {
        let doc = TravelDocument {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            doc_type: "PASSPORT".to_string(),
            name: "My passport".to_string(),
            issuing_country: Some("NL".to_string()),
            document_number: Some("NX9001234".to_string()),
            issue_date: None,
            expiry_date: None,
            notes: None,
            is_primary: true,
            alert_days_before: Some(90),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let view = TravelDocumentView::from(doc);
        assert_eq!(view.document_number.as_deref(), Some("***1234"));
    }
}
