//! Remote store collaborator seam.
//!
//! The cloud side exposes three tables (`classes`, `students`, `attendance`)
//! consumed via upsert-by-primary-key and owner-/class-scoped selects. The
//! core does not implement retries-with-batching, rate limiting or
//! authentication for the transport; those belong to the implementation
//! behind this trait. Domain models are `serde`-serializable so transports
//! can ship them as rows directly.

use crate::model::attendance::AttendanceRecord;
use crate::model::class::{Class, ClassId, OwnerId};
use crate::model::student::Student;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors reported by a remote store implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The remote rejected an upsert due to a uniqueness constraint, e.g.
    /// (owner_id, name) among non-deleted classes. Row-scoped: the push
    /// engine skips and continues.
    UniqueViolation(String),
    /// Transport-level failure (network, server error). Retryable for
    /// idempotent upserts.
    Transport(String),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UniqueViolation(detail) => {
                write!(f, "remote uniqueness violation: {detail}")
            }
            Self::Transport(detail) => write!(f, "remote transport failure: {detail}"),
        }
    }
}

impl Error for RemoteError {}

/// Collaborator interface over the shared cloud store.
pub trait RemoteStore: Send + Sync {
    /// Samples network reachability at call time. Sync passes check this
    /// once at their start; there is no continuous subscription.
    fn is_reachable(&self) -> bool;

    /// Upserts one class row by id, tombstones included.
    fn upsert_class(&self, class: &Class) -> RemoteResult<()>;

    /// Upserts one student row by id, tombstones included.
    fn upsert_student(&self, student: &Student) -> RemoteResult<()>;

    /// Upserts one attendance row by id.
    fn upsert_attendance(&self, record: &AttendanceRecord) -> RemoteResult<()>;

    /// Fetches the owner's non-deleted classes. An empty result means the
    /// account has no cloud data yet; it is not an error.
    fn fetch_classes(&self, owner: OwnerId) -> RemoteResult<Vec<Class>>;

    /// Fetches one class's non-deleted students.
    fn fetch_students(&self, class_id: ClassId) -> RemoteResult<Vec<Student>>;

    /// Fetches one class's attendance rows. Attendance has no soft delete,
    /// so there is no deletion filter.
    fn fetch_attendance(&self, class_id: ClassId) -> RemoteResult<Vec<AttendanceRecord>>;
}
