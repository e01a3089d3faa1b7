//! Cloud synchronization: explicit push/pull against a remote store.
//!
//! # Responsibility
//! - Define the remote-store collaborator seam consumed by the engine.
//! - Run one-directional whole-table push and whole-account pull passes,
//!   triggered explicitly by the caller, never concurrently.
//!
//! # Invariants
//! - At most one of push/pull is in flight; concurrent triggers are
//!   rejected with a retry-later error, never queued.
//! - Push propagates tombstones; pull preserves remote identifiers.
//! - Push is row-scoped best effort; pull aborts whole on I/O failure.

pub mod engine;
pub mod remote;

use crate::repo::RepoError;
use crate::sync::engine::SyncStatus;
use crate::sync::remote::RemoteError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SyncResult<T> = Result<T, SyncError>;

/// Aggregate sync outcome errors. Row-level remote conflicts are not here:
/// they are logged, skipped and surfaced through the push report.
#[derive(Debug)]
pub enum SyncError {
    /// Another sync pass is in flight; retry later.
    Busy(SyncStatus),
    /// No account identity is available.
    NotAuthenticated,
    /// The remote store is not reachable right now.
    Unreachable,
    /// Remote transport failure that aborted the operation.
    Remote(RemoteError),
    /// Local storage failure during a sync pass.
    Repo(RepoError),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy(status) => write!(f, "sync already in flight ({status:?}); retry later"),
            Self::NotAuthenticated => write!(f, "no authenticated user for sync"),
            Self::Unreachable => write!(f, "remote store is not reachable"),
            Self::Remote(err) => write!(f, "sync failed: {err}"),
            Self::Repo(err) => write!(f, "sync failed: {err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Remote(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RemoteError> for SyncError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

impl From<RepoError> for SyncError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}
