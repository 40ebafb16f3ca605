//! Snapshot repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Read and write the single serialized snapshot blob.
//! - Fall back to the seed snapshot on missing or corrupt stored data,
//!   surfacing the cause instead of failing the load.
//!
//! # Invariants
//! - `save` always overwrites the whole blob; no versioning, no merge.
//! - A missing blob is seeded and immediately persisted on first load.
//! - A corrupt blob is left in place; it is only replaced by the next
//!   explicit save.
//!
//! # See also
//! - docs/architecture/persistence.md

use crate::db::{migrations, DbError};
use crate::model::snapshot::Snapshot;
use crate::wire::{decode_snapshot, encode_snapshot, DecodeError};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fixed key the snapshot blob lives under.
pub const SNAPSHOT_KEY: &str = "inventory";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence errors for snapshot load/save operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Encode(DecodeError),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to serialize snapshot: {err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection is not migrated: schema version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table missing: {table}"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column missing: {table}.{column}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Why a load returned the seed snapshot instead of stored data.
///
/// Both cases are non-fatal; callers turn them into a notification.
#[derive(Debug)]
pub enum LoadFallback {
    /// No blob was stored yet; the seed was persisted in its place.
    MissingBlob,
    /// The stored blob failed to decode; the seed is served in memory only.
    Corrupt(DecodeError),
}

/// Load result: the snapshot to run with, plus fallback metadata.
#[derive(Debug)]
pub struct LocalLoad {
    pub snapshot: Snapshot,
    pub fallback: Option<LoadFallback>,
}

/// Persistence contract for the snapshot blob.
pub trait SnapshotRepository {
    /// Reads the stored snapshot, falling back to the seed when needed.
    fn load(&self) -> RepoResult<LocalLoad>;
    /// Serializes and overwrites the single stored blob.
    fn save(&self, snapshot: &Snapshot) -> RepoResult<()>;
}

/// SQLite-backed snapshot repository.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn read_blob(&self) -> RepoResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT value FROM kv_blobs WHERE key = ?1;",
                [SNAPSHOT_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(payload)
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn load(&self) -> RepoResult<LocalLoad> {
        match self.read_blob()? {
            None => {
                let seed = Snapshot::seed();
                self.save(&seed)?;
                info!("event=snapshot_load module=repo status=ok fallback=seeded");
                Ok(LocalLoad {
                    snapshot: seed,
                    fallback: Some(LoadFallback::MissingBlob),
                })
            }
            Some(payload) => match decode_snapshot(&payload) {
                Ok(snapshot) => {
                    info!(
                        "event=snapshot_load module=repo status=ok items={}",
                        snapshot.items.len()
                    );
                    Ok(LocalLoad {
                        snapshot,
                        fallback: None,
                    })
                }
                Err(err) => {
                    warn!("event=snapshot_load module=repo status=corrupt error={err}");
                    Ok(LocalLoad {
                        snapshot: Snapshot::seed(),
                        fallback: Some(LoadFallback::Corrupt(err)),
                    })
                }
            },
        }
    }

    fn save(&self, snapshot: &Snapshot) -> RepoResult<()> {
        let payload = encode_snapshot(snapshot).map_err(RepoError::Encode)?;
        self.conn.execute(
            "INSERT INTO kv_blobs (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![
                SNAPSHOT_KEY,
                payload,
                snapshot.last_updated.timestamp_millis()
            ],
        )?;

        info!(
            "event=snapshot_save module=repo status=ok items={}",
            snapshot.items.len()
        );
        Ok(())
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = migrations::latest_version();
    if actual_version == 0 {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "kv_blobs")? {
        return Err(RepoError::MissingRequiredTable("kv_blobs"));
    }
    for column in ["key", "value", "updated_at"] {
        if !table_has_column(conn, "kv_blobs", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "kv_blobs",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
