//! Domain model for the tracked inventory.
//!
//! # Responsibility
//! - Define the canonical item record and snapshot shape used by core logic.
//! - Keep one serialized shape shared by every persistence backend.
//!
//! # Invariants
//! - Every item carries a stable integer `ItemId` unique within a snapshot.
//! - The snapshot is the atomic unit of persistence; it is never written or
//!   read partially.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod item;
pub mod snapshot;
