//! Core domain logic for Rollbook.
//! This crate is the single source of truth for roster, attendance and sync
//! invariants; frontends stay thin.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;
pub mod sync;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::attendance::{AttendanceRecord, AttendanceStatus, RecordId};
pub use model::class::{Class, ClassId, OwnerId};
pub use model::student::{Student, StudentId};
pub use repo::attendance_repo::{AttendanceRepository, SqliteAttendanceRepository};
pub use repo::class_repo::{ClassRepository, SqliteClassRepository};
pub use repo::student_repo::{SqliteStudentRepository, StudentRepository};
pub use repo::sync_state_repo::{SqliteSyncStateRepository, SyncMetadata, SyncStateRepository};
pub use repo::{RepoError, RepoResult};
pub use service::attendance_service::{AttendanceEntry, AttendanceService};
pub use service::roster_service::{RosterEntry, RosterService};
pub use service::{DomainError, DomainResult};
pub use session::{SessionProvider, StaticSession};
pub use sync::engine::{
    PullReport, PushReport, RetryPolicy, SkippedClass, SyncEngine, SyncStatus,
};
pub use sync::remote::{RemoteError, RemoteResult, RemoteStore};
pub use sync::{SyncError, SyncResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
