//! Inventory item record and validation rules.
//!
//! # Responsibility
//! - Define the canonical item shape stored in snapshots.
//! - Own name/quantity validation shared by add, adjust and import paths.
//!
//! # Invariants
//! - `name` is stored trimmed and is never empty.
//! - `quantity` is never negative; callers reject instead of clamping.
//! - Name uniqueness is case-insensitive and enforced by the store.
//!
//! # See also
//! - docs/architecture/data-model.md

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable item identifier assigned by the store.
///
/// Ids are `max(existing) + 1`, starting at `1` for an empty inventory. Kept
/// as a type alias to make semantic intent explicit in signatures.
pub type ItemId = u64;

/// Canonical inventory record.
///
/// Serialized field names (`id`, `name`, `quantity`) are part of the stored
/// JSON contract and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Stable id unique within one snapshot.
    pub id: ItemId,
    /// Display name, trimmed, compared case-insensitively for uniqueness.
    pub name: String,
    /// Units on hand. Always `>= 0`.
    pub quantity: i64,
}

/// Validation failures for item fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    /// Name is empty after trimming.
    EmptyName,
    /// Quantity input is below zero.
    NegativeQuantity { quantity: i64 },
    /// Applying the delta would drive the quantity below zero.
    QuantityUnderflow { current: i64, delta: i64 },
    /// Quantity arithmetic exceeded the representable range.
    QuantityOverflow,
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "item name cannot be empty"),
            Self::NegativeQuantity { quantity } => {
                write!(f, "quantity cannot be negative, got {quantity}")
            }
            Self::QuantityUnderflow { current, delta } => write!(
                f,
                "quantity adjustment {delta} would drop below zero (current {current})"
            ),
            Self::QuantityOverflow => write!(f, "quantity exceeds the representable range"),
        }
    }
}

impl Error for ItemValidationError {}

impl Item {
    /// Creates a validated item from raw user input.
    pub fn new(
        id: ItemId,
        name: impl Into<String>,
        quantity: i64,
    ) -> Result<Self, ItemValidationError> {
        let name = normalize_name(&name.into())?;
        let quantity = validate_quantity(quantity)?;
        Ok(Self { id, name, quantity })
    }

    /// Checks stored-state invariants.
    ///
    /// Read paths reject invalid persisted state instead of masking it.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.name.trim().is_empty() {
            return Err(ItemValidationError::EmptyName);
        }
        if self.quantity < 0 {
            return Err(ItemValidationError::NegativeQuantity {
                quantity: self.quantity,
            });
        }
        Ok(())
    }

    /// Case-insensitive name match used for duplicate detection.
    pub fn name_matches(&self, candidate: &str) -> bool {
        self.name.to_lowercase() == candidate.to_lowercase()
    }
}

/// Loosely shaped record accepted by the import path.
///
/// Missing or invalid fields are coerced by `InventoryStore::replace_all`:
/// ids are regenerated, quantity defaults to 0. A usable name is mandatory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ItemDraft {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Trims a raw name and rejects empty results.
pub fn normalize_name(raw: &str) -> Result<String, ItemValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ItemValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}

/// Rejects negative quantity input.
pub fn validate_quantity(quantity: i64) -> Result<i64, ItemValidationError> {
    if quantity < 0 {
        return Err(ItemValidationError::NegativeQuantity { quantity });
    }
    Ok(quantity)
}

#[cfg(test)]
mod tests {
    use super::{normalize_name, validate_quantity, Item, ItemValidationError};

    #[test]
    fn new_trims_name_and_keeps_quantity() {
        let item = Item::new(1, "  Zaino  ", 10).expect("valid item");
        assert_eq!(item.name, "Zaino");
        assert_eq!(item.quantity, 10);
    }

    #[test]
    fn new_rejects_blank_name() {
        let err = Item::new(1, "   ", 1).expect_err("blank name must fail");
        assert_eq!(err, ItemValidationError::EmptyName);
    }

    #[test]
    fn new_rejects_negative_quantity() {
        let err = Item::new(1, "Borsa", -1).expect_err("negative quantity must fail");
        assert_eq!(err, ItemValidationError::NegativeQuantity { quantity: -1 });
    }

    #[test]
    fn name_match_is_case_insensitive() {
        let item = Item::new(1, "Zaino", 1).expect("valid item");
        assert!(item.name_matches("zaino"));
        assert!(item.name_matches("ZAINO"));
        assert!(!item.name_matches("zaini"));
    }

    #[test]
    fn validate_flags_corrupt_stored_state() {
        let corrupt = Item {
            id: 1,
            name: "ok".to_string(),
            quantity: -3,
        };
        assert!(corrupt.validate().is_err());
    }

    #[test]
    fn helpers_cover_both_field_rules() {
        assert_eq!(normalize_name(" x ").expect("valid"), "x");
        assert!(normalize_name("\t").is_err());
        assert_eq!(validate_quantity(0).expect("zero is allowed"), 0);
        assert!(validate_quantity(-5).is_err());
    }
}
