//! Inventory snapshot, the atomic unit of persistence.
//!
//! # Responsibility
//! - Bundle the ordered item list with its last-modified timestamp.
//! - Provide the seed state used on first run and on recovery.
//!
//! # Invariants
//! - Items keep insertion order.
//! - `last_updated` moves forward on every successful store mutation.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::model::item::{Item, ItemId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full inventory state, written and read as a whole.
///
/// The serialized shape (`items`, `lastUpdated`) is the stored JSON contract
/// shared by the local blob and the remote file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub items: Vec<Item>,
    pub last_updated: DateTime<Utc>,
}

impl Snapshot {
    /// Returns the default seed state: no items, stamped now.
    pub fn seed() -> Self {
        Self {
            items: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    /// Finds one item by stable id.
    pub fn find(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Finds one item by case-insensitive name.
    pub fn find_by_name(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.name_matches(name))
    }

    /// Returns the next free id: `max(existing) + 1`, or `1` when empty.
    pub fn next_id(&self) -> ItemId {
        self.items
            .iter()
            .map(|item| item.id)
            .max()
            .map_or(1, |max| max + 1)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::seed()
    }
}
