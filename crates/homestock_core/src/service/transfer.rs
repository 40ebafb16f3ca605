//! Export/import document formats.
//!
//! # Responsibility
//! - Produce the downloadable export document.
//! - Parse user-supplied import files into drafts for the store.
//!
//! # Invariants
//! - An import document must carry an `items` array; anything else is
//!   rejected wholesale before any store mutation.

use crate::model::item::{Item, ItemDraft};
use crate::model::snapshot::Snapshot;
use crate::wire::DecodeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version stamped into every export file.
pub const EXPORT_FORMAT_VERSION: u32 = 1;

/// Downloadable inventory document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub items: Vec<Item>,
    pub last_updated: DateTime<Utc>,
    pub version: u32,
    pub exported_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct ImportDocument {
    items: Vec<ItemDraft>,
}

/// Builds the export document for the current snapshot.
pub fn export_document(snapshot: &Snapshot) -> ExportDocument {
    ExportDocument {
        items: snapshot.items.clone(),
        last_updated: snapshot.last_updated,
        version: EXPORT_FORMAT_VERSION,
        exported_at: Utc::now(),
    }
}

/// Serializes an export document to its downloadable JSON form.
pub fn encode_export(document: &ExportDocument) -> Result<String, DecodeError> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Parses a user-supplied import file into item drafts.
///
/// Requires a JSON object whose `items` field is an array of item-shaped
/// records; any other shape rejects the whole document.
pub fn parse_import(payload: &str) -> Result<Vec<ItemDraft>, DecodeError> {
    let document: ImportDocument = serde_json::from_str(payload)?;
    Ok(document.items)
}
