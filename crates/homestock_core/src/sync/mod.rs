//! Remote persistence over a version-controlled hosted file.
//!
//! # Responsibility
//! - Read and write the snapshot as a repository file through a contents
//!   REST API, guarded by an optimistic-concurrency version token.
//! - Track the token lifecycle (`Unsynced` until the first successful read).
//!
//! # Invariants
//! - Every write passes the previously observed token; a moved remote
//!   version rejects the write instead of silently overwriting newer data.
//! - The adapter performs no retry and no conflict resolution.
//!
//! # See also
//! - docs/architecture/remote-sync.md

pub mod remote;
pub mod session;
