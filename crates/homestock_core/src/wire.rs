//! Snapshot JSON codec shared by every persistence backend.
//!
//! # Responsibility
//! - Encode snapshots to the stored JSON contract.
//! - Decode stored blobs tolerantly: absent fields fall back to defaults,
//!   structurally wrong blobs are rejected.
//!
//! # Invariants
//! - A decoded snapshot always satisfies item invariants; corrupt persisted
//!   state is rejected instead of masked.
//! - Decoding accepts documents without `items` or `lastUpdated` (legacy
//!   hand-edited files) by substituting an empty list / the current time.
//!
//! # See also
//! - docs/architecture/persistence.md

use crate::model::item::{Item, ItemId, ItemValidationError};
use crate::model::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Codec failures for stored or imported blobs.
#[derive(Debug)]
pub enum DecodeError {
    /// Payload is not parseable as the expected JSON shape.
    Json(serde_json::Error),
    /// Payload parsed but an item violates stored-state invariants.
    Item(ItemValidationError),
    /// Two items share one id.
    DuplicateId(ItemId),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "snapshot payload is not valid JSON: {err}"),
            Self::Item(err) => write!(f, "snapshot contains an invalid item: {err}"),
            Self::DuplicateId(id) => write!(f, "snapshot contains duplicate item id {id}"),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Item(err) => Some(err),
            Self::DuplicateId(_) => None,
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<ItemValidationError> for DecodeError {
    fn from(value: ItemValidationError) -> Self {
        Self::Item(value)
    }
}

// Lenient read shape: the original files sometimes miss either field.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    #[serde(default)]
    items: Option<Vec<Item>>,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
}

/// Serializes a snapshot to the pretty-printed stored form.
pub fn encode_snapshot(snapshot: &Snapshot) -> Result<String, DecodeError> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// Parses and validates one stored snapshot blob.
pub fn decode_snapshot(payload: &str) -> Result<Snapshot, DecodeError> {
    let raw: RawSnapshot = serde_json::from_str(payload)?;
    let items = raw.items.unwrap_or_default();

    let mut seen = HashSet::new();
    for item in &items {
        item.validate()?;
        if !seen.insert(item.id) {
            return Err(DecodeError::DuplicateId(item.id));
        }
    }

    Ok(Snapshot {
        items,
        last_updated: raw.last_updated.unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::{decode_snapshot, encode_snapshot, DecodeError};
    use crate::model::item::Item;
    use crate::model::snapshot::Snapshot;

    #[test]
    fn roundtrip_preserves_items_and_timestamp() {
        let mut snapshot = Snapshot::seed();
        snapshot
            .items
            .push(Item::new(1, "Zaino", 10).expect("valid item"));

        let encoded = encode_snapshot(&snapshot).expect("snapshot should encode");
        let decoded = decode_snapshot(&encoded).expect("snapshot should decode");
        assert_eq!(decoded.items, snapshot.items);
        assert_eq!(decoded.last_updated, snapshot.last_updated);
    }

    #[test]
    fn encoded_form_uses_contract_field_names() {
        let encoded = encode_snapshot(&Snapshot::seed()).expect("snapshot should encode");
        assert!(encoded.contains("\"items\""));
        assert!(encoded.contains("\"lastUpdated\""));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let decoded = decode_snapshot("{}").expect("empty object should decode");
        assert!(decoded.items.is_empty());
    }

    #[test]
    fn non_array_items_is_rejected() {
        let err = decode_snapshot(r#"{"items": 5}"#).expect_err("non-array items must fail");
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn garbage_payload_is_rejected() {
        assert!(decode_snapshot("not json at all").is_err());
    }

    #[test]
    fn negative_stored_quantity_is_rejected() {
        let err = decode_snapshot(r#"{"items": [{"id": 1, "name": "x", "quantity": -2}]}"#)
            .expect_err("negative stored quantity must fail");
        assert!(matches!(err, DecodeError::Item(_)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let payload = r#"{"items": [
            {"id": 1, "name": "a", "quantity": 0},
            {"id": 1, "name": "b", "quantity": 0}
        ]}"#;
        let err = decode_snapshot(payload).expect_err("duplicate ids must fail");
        assert!(matches!(err, DecodeError::DuplicateId(1)));
    }
}
