//! Domain model for roster and attendance data.
//!
//! # Responsibility
//! - Define the canonical records persisted locally and mirrored to the
//!   remote store during sync.
//! - Keep lifecycle rules (soft-delete tombstones, identifier stability)
//!   next to the data they protect.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID that never changes after
//!   creation, including across rename and sync round trips.
//! - Class/Student deletion is represented by soft-delete tombstones, not
//!   hard delete. Attendance is the exception: a day is hard-deleted.
//! - An attendance row's existence means "present"; absence is never stored.

pub mod attendance;
pub mod class;
pub mod student;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in epoch milliseconds.
///
/// Stamps `created_at`/`updated_at` on locally constructed entities; pulled
/// rows keep the timestamps the remote already carries.
pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
