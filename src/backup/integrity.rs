use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::backup::document::{BackupDocument, IntegrityBlock, INTEGRITY_ALGORITHM};
use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Serializes a document to its canonical signing form: the JSON produced by
/// the struct's own field order, with the `integrity` block omitted.
fn canonical_bytes(document: &BackupDocument) -> Result<Vec<u8>> {
    let unsigned = BackupDocument {
        integrity: None,
        ..document.clone()
    };
    sonic_rs::to_vec(&unsigned)
        .map_err(|e| AppError::Internal(format!("Failed to serialize backup for signing: {}", e)))
}

fn compute_hmac(secret: &[u8], payload: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(format!("Invalid backup signing secret: {}", e)))?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Signs a backup document, returning the integrity block to attach.
pub fn sign(document: &BackupDocument, secret: &[u8]) -> Result<IntegrityBlock> {
    let payload = canonical_bytes(document)?;
    let signature = compute_hmac(secret, &payload)?;
    Ok(IntegrityBlock {
        algorithm: INTEGRITY_ALGORITHM.to_string(),
        signature,
    })
}

/// Verifies a document's integrity block before restore.
///
/// Documents without a block are accepted with a warning: backups made
/// before signing existed carry none. Signatures are compared in constant
/// time after hex-decoding both sides.
pub fn verify(document: &BackupDocument, secret: &[u8]) -> Result<()> {
    let block = match &document.integrity {
        None => {
            tracing::warn!(
                "Backup has no integrity block (pre-signing export), restoring unverified"
            );
            return Ok(());
        }
        Some(block) => block,
    };

    if block.algorithm != INTEGRITY_ALGORITHM {
        return Err(AppError::Validation(format!(
            "Unsupported backup integrity algorithm: {}",
            block.algorithm
        )));
    }

    let payload = canonical_bytes(document)?;
    let computed = compute_hmac(secret, &payload)?;

    let expected = hex::decode(&block.signature)
        .map_err(|_| AppError::Integrity("Malformed backup signature encoding".to_string()))?;
    let actual = hex::decode(&computed)
        .map_err(|e| AppError::Internal(format!("Invalid computed signature encoding: {}", e)))?;

    if expected.len() != actual.len() || expected.ct_eq(actual.as_slice()).unwrap_u8() != 1 {
        return Err(AppError::Integrity(
            "Backup integrity check failed: the signature does not match, the file may have been tampered with".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::document::{
        TagSnapshot, TripSeriesSnapshot, UserProfileSnapshot, CURRENT_SCHEMA_VERSION,
    };
    use chrono::Utc;

    const SECRET: &[u8] = b"backup-signing-secret-for-tests!!";

    fn sample_document() -> BackupDocument {
        BackupDocument {
            version: CURRENT_SCHEMA_VERSION.to_string(),
            export_date: Utc::now(),
            user: UserProfileSnapshot {
                email: "ada@example.com".to_string(),
                display_name: "Ada".to_string(),
                timezone: Some("Europe/Lisbon".to_string()),
                home_currency: Some("EUR".to_string()),
                distance_unit: None,
                weather_api_key: None,
            },
            tags: vec![TagSnapshot {
                name: "hiking".to_string(),
                color: Some("#00aa55".to_string()),
            }],
            companions: vec![],
            location_categories: vec![],
            checklists: vec![],
            travel_documents: vec![],
            trip_series: vec![TripSeriesSnapshot {
                name: "Interrail".to_string(),
                description: None,
            }],
            trips: vec![],
            integrity: None,
        }
    }

    #[test]
    fn sign_then_verify_accepts() {
        let mut doc = sample_document();
        doc.integrity = Some(sign(&doc, SECRET).unwrap());
        verify(&doc, SECRET).unwrap();
    }

    #[test]
    fn signing_ignores_any_existing_integrity_block() {
        let mut doc = sample_document();
        let first = sign(&doc, SECRET).unwrap();
        doc.integrity = Some(first.clone());
        let second = sign(&doc, SECRET).unwrap();
        assert_eq!(first.signature, second.signature);
    }

    #[test]
    fn mutated_document_is_rejected() {
        let mut doc = sample_document();
        doc.integrity = Some(sign(&doc, SECRET).unwrap());
        doc.tags[0].name = "biking".to_string();

        let err = verify(&doc, SECRET).unwrap_err();
        assert!(matches!(err, AppError::Integrity(_)));
    }

    #[test]
    fn flipped_signature_byte_is_rejected() {
        let mut doc = sample_document();
        let mut block = sign(&doc, SECRET).unwrap();
        let mut bytes = hex::decode(&block.signature).unwrap();
        bytes[0] ^= 0x01;
        block.signature = hex::encode(bytes);
        doc.integrity = Some(block);

        assert!(matches!(
            verify(&doc, SECRET),
            Err(AppError::Integrity(_))
        ));
    }

    #[test]
    fn truncated_signature_is_rejected() {
        let mut doc = sample_document();
        let mut block = sign(&doc, SECRET).unwrap();
        block.signature.truncate(16);
        doc.integrity = Some(block);

        assert!(matches!(
            verify(&doc, SECRET),
            Err(AppError::Integrity(_))
        ));
    }

    #[test]
    fn non_hex_signature_is_rejected() {
        let mut doc = sample_document();
        doc.integrity = Some(IntegrityBlock {
            algorithm: INTEGRITY_ALGORITHM.to_string(),
            signature: "not-hex-at-all".to_string(),
        });

        assert!(matches!(
            verify(&doc, SECRET),
            Err(AppError::Integrity(_))
        ));
    }

    #[test]
    fn wrong_algorithm_is_a_validation_error() {
        let mut doc = sample_document();
        let block = sign(&doc, SECRET).unwrap();
        doc.integrity = Some(IntegrityBlock {
            algorithm: "md5".to_string(),
            signature: block.signature,
        });

        assert!(matches!(
            verify(&doc, SECRET),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let mut doc = sample_document();
        doc.integrity = Some(sign(&doc, SECRET).unwrap());

        assert!(matches!(
            verify(&doc, b"a-different-secret-of-decent-size!"),
            Err(AppError::Integrity(_))
        ));
    }

    #[test]
    fn legacy_document_without_block_is_accepted() {
        let doc = sample_document();
        verify(&doc, SECRET).unwrap();
    }
}
