//! Version-token lifecycle over the remote store.
//!
//! # Responsibility
//! - Hold the token from the most recent successful read or write and feed
//!   it into every save.
//! - Refuse writes while no token is held (`Unsynced` state).
//!
//! # Invariants
//! - A failed save keeps the previously held token; whether to re-load is
//!   the caller's policy, the session never retries on its own.
//! - Operations take `&mut self`, so a second save cannot start against a
//!   token an in-flight save is about to replace.
//!
//! # See also
//! - docs/architecture/remote-sync.md

use crate::model::snapshot::Snapshot;
use crate::sync::remote::{RemoteSnapshotStore, SyncError, SyncResult, VersionToken};

/// Remote session state machine: `Unsynced` until the first successful
/// load, then `Synced(token)` with the token rolling forward on every
/// successful read or write.
pub struct RemoteSession {
    store: RemoteSnapshotStore,
    token: Option<VersionToken>,
}

impl RemoteSession {
    /// Starts an unsynced session; call [`RemoteSession::load`] before saving.
    pub fn new(store: RemoteSnapshotStore) -> Self {
        Self { store, token: None }
    }

    /// Whether a version token is currently held.
    pub fn is_synced(&self) -> bool {
        self.token.is_some()
    }

    /// Token from the most recent successful read or write.
    pub fn version_token(&self) -> Option<&VersionToken> {
        self.token.as_ref()
    }

    /// Fetches remote state and adopts its version token.
    ///
    /// Also serves as the periodic read-only refresh. A refresh completing
    /// after a concurrent save simply wins observably; this weak-consistency
    /// trade-off is accepted rather than merged.
    ///
    /// On failure the held token and the caller's in-memory snapshot stay
    /// untouched; the inventory is never reset by a failed load.
    pub async fn load(&mut self) -> SyncResult<Snapshot> {
        let (snapshot, token) = self.store.load().await?;
        self.token = Some(token);
        Ok(snapshot)
    }

    /// Saves with a generated, timestamped commit message.
    pub async fn save(&mut self, snapshot: &Snapshot) -> SyncResult<()> {
        let message = format!(
            "inventory update: {}",
            snapshot.last_updated.to_rfc3339()
        );
        self.save_with_message(snapshot, &message).await
    }

    /// Saves conditioned on the held token, keeping the returned token as
    /// the baseline for the next write.
    ///
    /// Fails with `SyncError::NotSynced` before the first successful load.
    /// A version conflict leaves both the remote file and the held token
    /// unchanged; the caller decides between re-loading and giving up.
    pub async fn save_with_message(&mut self, snapshot: &Snapshot, message: &str) -> SyncResult<()> {
        let token = self.token.as_ref().ok_or(SyncError::NotSynced)?;
        let new_token = self.store.save(snapshot, token, message).await?;
        self.token = Some(new_token);
        Ok(())
    }
}
