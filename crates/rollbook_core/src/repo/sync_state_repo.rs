//! Sync bookkeeping repository.
//!
//! # Responsibility
//! - Persist the last successful sync timestamp in the single-row
//!   `sync_state` table.
//! - Compute best-effort pending-change counters for status displays.
//!
//! # Invariants
//! - `sync_state` always holds exactly one row (seeded by migration).
//! - Pending counters are advisory: they may read 0 even with outstanding
//!   changes (same-millisecond writes, clock skew) and must not gate sync.

use crate::model::class::OwnerId;
use crate::repo::{ensure_connection_ready, RepoResult};
use rusqlite::{params, Connection};

/// Process-local sync bookkeeping read model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncMetadata {
    /// Epoch milliseconds of the last completed push or pull, if any.
    pub last_synced_at: Option<i64>,
    /// Classes changed since the last sync (best effort).
    pub pending_classes: u64,
    /// Students changed since the last sync (best effort).
    pub pending_students: u64,
    /// Attendance rows changed since the last sync (best effort).
    pub pending_attendance: u64,
}

/// Repository interface for sync bookkeeping.
pub trait SyncStateRepository {
    /// Returns the last recorded sync timestamp.
    fn last_synced_at(&self) -> RepoResult<Option<i64>>;
    /// Records a sync timestamp (also after partial push completion).
    fn set_last_synced_at(&self, timestamp_ms: i64) -> RepoResult<()>;
    /// Computes bookkeeping counters for one owner's data.
    fn metadata(&self, owner: OwnerId) -> RepoResult<SyncMetadata>;
}

/// SQLite-backed sync bookkeeping repository.
pub struct SqliteSyncStateRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSyncStateRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[("sync_state", &["id", "last_synced_at"])])?;
        Ok(Self { conn })
    }
}

impl SyncStateRepository for SqliteSyncStateRepository<'_> {
    fn last_synced_at(&self) -> RepoResult<Option<i64>> {
        let value: Option<i64> = self.conn.query_row(
            "SELECT last_synced_at FROM sync_state WHERE id = 1;",
            [],
            |row| row.get(0),
        )?;
        Ok(value)
    }

    fn set_last_synced_at(&self, timestamp_ms: i64) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE sync_state SET last_synced_at = ?1 WHERE id = 1;",
            [timestamp_ms],
        )?;
        Ok(())
    }

    fn metadata(&self, owner: OwnerId) -> RepoResult<SyncMetadata> {
        let last_synced_at = self.last_synced_at()?;
        // When nothing was ever synced, everything owned counts as pending.
        let since = last_synced_at.unwrap_or(i64::MIN);
        let owner_text = owner.to_string();

        let pending_classes: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM classes
             WHERE owner_id = ?1
               AND updated_at > ?2;",
            params![owner_text, since],
            |row| row.get(0),
        )?;

        let pending_students: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM students
             WHERE class_id IN (SELECT id FROM classes WHERE owner_id = ?1)
               AND updated_at > ?2;",
            params![owner_text, since],
            |row| row.get(0),
        )?;

        let pending_attendance: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM attendance
             WHERE class_id IN (SELECT id FROM classes WHERE owner_id = ?1)
               AND updated_at > ?2;",
            params![owner_text, since],
            |row| row.get(0),
        )?;

        Ok(SyncMetadata {
            last_synced_at,
            pending_classes: pending_classes as u64,
            pending_students: pending_students as u64,
            pending_attendance: pending_attendance as u64,
        })
    }
}
