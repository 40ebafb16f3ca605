//! Canonical in-memory inventory store.
//!
//! # Responsibility
//! - Own the single mutable snapshot and every mutation applied to it.
//! - Enforce id uniqueness, case-insensitive name uniqueness, and the
//!   non-negative quantity rule.
//!
//! # Invariants
//! - Failed operations leave the snapshot untouched.
//! - Every successful mutation refreshes `last_updated`.
//! - Duplicate-name adds merge quantities instead of inserting; the merge
//!   decision belongs to the caller-supplied port, never to the store.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::model::item::{
    normalize_name, validate_quantity, Item, ItemDraft, ItemId, ItemValidationError,
};
use crate::model::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Mutation errors reported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Validation(ItemValidationError),
    NotFound(ItemId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<ItemValidationError> for StoreError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Caller-supplied capability deciding whether a duplicate-name add merges
/// into the existing item.
///
/// Interactive frontends back this with a confirmation dialog; headless
/// callers pick one of the trivial deciders below.
pub trait MergeDecider {
    fn confirm_merge(&self, existing: &Item, incoming_quantity: i64) -> bool;
}

/// Always merges duplicate names.
pub struct AlwaysMerge;

impl MergeDecider for AlwaysMerge {
    fn confirm_merge(&self, _existing: &Item, _incoming_quantity: i64) -> bool {
        true
    }
}

/// Never merges; duplicate-name adds abort without mutation.
pub struct NeverMerge;

impl MergeDecider for NeverMerge {
    fn confirm_merge(&self, _existing: &Item, _incoming_quantity: i64) -> bool {
        false
    }
}

/// Result of an add operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// A fresh item was appended.
    Created(Item),
    /// Quantity was merged into an existing same-name item.
    Merged(Item),
    /// A same-name item exists and the caller declined the merge; nothing
    /// was mutated.
    Declined { existing: Item },
}

impl AddOutcome {
    /// Returns whether the operation changed the snapshot.
    pub fn mutated(&self) -> bool {
        !matches!(self, Self::Declined { .. })
    }
}

/// Single owned inventory state with an explicit lifecycle: constructed at
/// startup, hydrated from a persistence adapter, flushed by the caller after
/// each mutation.
#[derive(Debug, Default)]
pub struct InventoryStore {
    snapshot: Snapshot,
}

impl InventoryStore {
    /// Creates a store holding the empty seed snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store over an already-loaded snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    /// Adopts a loaded snapshot wholesale, discarding current state.
    ///
    /// Used by the load/refresh flow; keeps the loaded timestamp.
    pub fn hydrate(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
    }

    /// Ordered item listing. Pure read.
    pub fn items(&self) -> &[Item] {
        &self.snapshot.items
    }

    /// Borrow of the current state for persistence or rendering.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Timestamp of the most recent mutation.
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.snapshot.last_updated
    }

    /// Adds an item, or merges into a case-insensitive name match.
    ///
    /// # Contract
    /// - Trims `name`; empty names and negative quantities are rejected.
    /// - On a name match the `decider` is consulted: confirmed merges add
    ///   quantities onto the existing item, declined merges abort with no
    ///   mutation.
    /// - Otherwise appends a fresh item with id `max(existing) + 1`.
    pub fn add(
        &mut self,
        name: &str,
        quantity: i64,
        decider: &dyn MergeDecider,
    ) -> StoreResult<AddOutcome> {
        let name = normalize_name(name)?;
        let quantity = validate_quantity(quantity)?;

        if let Some(position) = self
            .snapshot
            .items
            .iter()
            .position(|item| item.name_matches(&name))
        {
            let existing = self.snapshot.items[position].clone();
            if !decider.confirm_merge(&existing, quantity) {
                return Ok(AddOutcome::Declined { existing });
            }

            let merged = existing
                .quantity
                .checked_add(quantity)
                .ok_or(ItemValidationError::QuantityOverflow)?;
            self.snapshot.items[position].quantity = merged;
            self.touch();
            return Ok(AddOutcome::Merged(self.snapshot.items[position].clone()));
        }

        let item = Item {
            id: self.snapshot.next_id(),
            name,
            quantity,
        };
        self.snapshot.items.push(item.clone());
        self.touch();
        Ok(AddOutcome::Created(item))
    }

    /// Applies a signed delta to one item's quantity.
    ///
    /// Rejects unknown ids and adjustments that would drop below zero; the
    /// rejected item keeps its previous quantity.
    pub fn adjust_quantity(&mut self, id: ItemId, delta: i64) -> StoreResult<Item> {
        let position = self.position(id).ok_or(StoreError::NotFound(id))?;
        let current = self.snapshot.items[position].quantity;
        let next = current
            .checked_add(delta)
            .ok_or(ItemValidationError::QuantityOverflow)?;
        if next < 0 {
            return Err(ItemValidationError::QuantityUnderflow { current, delta }.into());
        }

        self.snapshot.items[position].quantity = next;
        self.touch();
        Ok(self.snapshot.items[position].clone())
    }

    /// Removes one item by id, preserving the order of the remainder.
    ///
    /// Whether the user confirmed the removal is a caller concern.
    pub fn remove(&mut self, id: ItemId) -> StoreResult<Item> {
        let position = self.position(id).ok_or(StoreError::NotFound(id))?;
        let removed = self.snapshot.items.remove(position);
        self.touch();
        Ok(removed)
    }

    /// Atomically replaces the whole collection from import drafts.
    ///
    /// # Contract
    /// - Every draft needs a non-empty name; negative quantities are
    ///   rejected. Any failure rejects the entire import with no partial
    ///   replace.
    /// - Missing quantity coerces to 0.
    /// - Missing, non-positive, or already-claimed ids are regenerated.
    ///
    /// Returns the number of imported items.
    pub fn replace_all(&mut self, drafts: &[ItemDraft]) -> StoreResult<usize> {
        let mut resolved: Vec<(Option<ItemId>, String, i64)> = Vec::with_capacity(drafts.len());
        let mut claimed: HashSet<ItemId> = HashSet::new();

        for draft in drafts {
            let name = normalize_name(draft.name.as_deref().unwrap_or_default())?;
            let quantity = validate_quantity(draft.quantity.unwrap_or(0))?;
            let id = match draft.id {
                Some(raw) if raw >= 1 => {
                    let id = raw as ItemId;
                    claimed.insert(id).then_some(id)
                }
                _ => None,
            };
            resolved.push((id, name, quantity));
        }

        let mut next_free = claimed.iter().copied().max().map_or(1, |max| max + 1);
        let items = resolved
            .into_iter()
            .map(|(id, name, quantity)| {
                let id = id.unwrap_or_else(|| {
                    let fresh = next_free;
                    next_free += 1;
                    fresh
                });
                Item { id, name, quantity }
            })
            .collect::<Vec<_>>();

        let count = items.len();
        self.snapshot.items = items;
        self.touch();
        Ok(count)
    }

    fn position(&self, id: ItemId) -> Option<usize> {
        self.snapshot.items.iter().position(|item| item.id == id)
    }

    fn touch(&mut self) {
        self.snapshot.last_updated = Utc::now();
    }
}
