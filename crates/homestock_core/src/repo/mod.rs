//! Local persistence layer for the inventory snapshot.
//!
//! # Responsibility
//! - Define the snapshot persistence contract used by the service layer.
//! - Isolate SQLite blob-storage details from business orchestration.
//!
//! # Invariants
//! - The snapshot is persisted as one blob under one fixed key; there is no
//!   partial write path.
//!
//! # See also
//! - docs/architecture/persistence.md

pub mod snapshot_repo;
