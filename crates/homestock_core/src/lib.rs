//! Core domain logic for HomeStock.
//! This crate is the single source of truth for inventory invariants and
//! for both persistence backends (local SQLite blob, remote hosted file).

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod sync;
pub mod wire;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::item::{Item, ItemDraft, ItemId, ItemValidationError};
pub use model::snapshot::Snapshot;
pub use repo::snapshot_repo::{
    LoadFallback, LocalLoad, RepoError, RepoResult, SnapshotRepository, SqliteSnapshotRepository,
    SNAPSHOT_KEY,
};
pub use service::inventory_service::{InventoryService, ServiceError, ServiceResult};
pub use service::transfer::{
    encode_export, export_document, parse_import, ExportDocument, EXPORT_FORMAT_VERSION,
};
pub use store::{
    AddOutcome, AlwaysMerge, InventoryStore, MergeDecider, NeverMerge, StoreError, StoreResult,
};
pub use sync::remote::{
    RemoteConfig, RemoteSnapshotStore, SyncError, SyncResult, VersionToken,
    DEFAULT_POLL_INTERVAL_SECS,
};
pub use sync::session::RemoteSession;
pub use wire::{decode_snapshot, encode_snapshot, DecodeError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
