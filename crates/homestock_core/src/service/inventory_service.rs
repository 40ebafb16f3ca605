//! Inventory use-case service with flush-on-mutation persistence.
//!
//! # Responsibility
//! - Apply store mutations and flush the whole snapshot to the local
//!   repository after each one.
//! - Provide the export/import entry points over the transfer formats.
//!
//! # Invariants
//! - The in-memory snapshot stays the source of truth: a failed flush is
//!   reported but does not roll the mutation back.
//! - Import replaces the collection atomically or not at all.

use crate::model::item::{Item, ItemId};
use crate::model::snapshot::Snapshot;
use crate::repo::snapshot_repo::{LoadFallback, RepoError, SnapshotRepository};
use crate::service::transfer;
use crate::store::{AddOutcome, InventoryStore, MergeDecider, StoreError};
use crate::wire::DecodeError;
use chrono::{DateTime, Utc};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by inventory use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Store-level validation or not-found failure.
    Store(StoreError),
    /// Local persistence failure; the in-memory mutation already happened.
    Repo(RepoError),
    /// Export/import document codec failure.
    Codec(DecodeError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Codec(err) => Some(err),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Inventory facade over one store and one local repository.
pub struct InventoryService<R: SnapshotRepository> {
    store: InventoryStore,
    repo: R,
    startup_fallback: Option<LoadFallback>,
}

impl<R: SnapshotRepository> InventoryService<R> {
    /// Loads persisted state and builds a ready-to-use service.
    ///
    /// A missing or corrupt blob is non-fatal: the service starts from the
    /// seed snapshot and keeps the fallback cause for the caller to notify.
    pub fn open(repo: R) -> ServiceResult<Self> {
        let loaded = repo.load()?;
        if let Some(fallback) = &loaded.fallback {
            warn!("event=service_open module=service status=fallback cause={fallback:?}");
        }
        Ok(Self {
            store: InventoryStore::from_snapshot(loaded.snapshot),
            repo,
            startup_fallback: loaded.fallback,
        })
    }

    /// Why the startup load fell back to the seed snapshot, if it did.
    pub fn startup_fallback(&self) -> Option<&LoadFallback> {
        self.startup_fallback.as_ref()
    }

    /// Ordered item listing. Pure read.
    pub fn items(&self) -> &[Item] {
        self.store.items()
    }

    /// Borrow of the current snapshot.
    pub fn snapshot(&self) -> &Snapshot {
        self.store.snapshot()
    }

    /// Timestamp of the most recent mutation.
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.store.last_updated()
    }

    /// Adds or merges one item, then flushes.
    pub fn add(
        &mut self,
        name: &str,
        quantity: i64,
        decider: &dyn MergeDecider,
    ) -> ServiceResult<AddOutcome> {
        let outcome = self.store.add(name, quantity, decider)?;
        if outcome.mutated() {
            self.flush()?;
        }
        Ok(outcome)
    }

    /// Applies a quantity delta, then flushes.
    pub fn adjust_quantity(&mut self, id: ItemId, delta: i64) -> ServiceResult<Item> {
        let item = self.store.adjust_quantity(id, delta)?;
        self.flush()?;
        Ok(item)
    }

    /// Removes one item, then flushes.
    ///
    /// The caller is responsible for having confirmed the removal.
    pub fn remove(&mut self, id: ItemId) -> ServiceResult<Item> {
        let item = self.store.remove(id)?;
        self.flush()?;
        Ok(item)
    }

    /// Replaces the whole inventory from an import file, then flushes.
    ///
    /// Returns the number of imported items. A document that is not an
    /// `items` sequence, or that contains an invalid record, rejects the
    /// import wholesale with the existing inventory unchanged.
    pub fn import(&mut self, payload: &str) -> ServiceResult<usize> {
        let drafts = transfer::parse_import(payload).map_err(ServiceError::Codec)?;
        let count = self.store.replace_all(&drafts)?;
        self.flush()?;
        Ok(count)
    }

    /// Serializes the current state as a downloadable export document.
    pub fn export_json(&self) -> ServiceResult<String> {
        let document = transfer::export_document(self.store.snapshot());
        transfer::encode_export(&document).map_err(ServiceError::Codec)
    }

    fn flush(&mut self) -> ServiceResult<()> {
        self.repo.save(self.store.snapshot())?;
        Ok(())
    }
}
