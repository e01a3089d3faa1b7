//! Class domain model.
//!
//! # Responsibility
//! - Define the class record owned by one teacher account.
//! - Provide lifecycle helpers for soft-delete semantics.
//!
//! # Invariants
//! - `id` is stable and never reused for another class; rename must not
//!   mint a new id.
//! - `is_deleted` is the source of truth for tombstone state.
//! - Among active classes of one owner, `name` is unique (enforced by the
//!   mutation API, mirrored by the remote store).

use crate::model::now_ms;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a class.
pub type ClassId = Uuid;

/// Account identifier owning classes and, transitively, students.
pub type OwnerId = Uuid;

/// A class roster container owned by one account.
///
/// `owner_id` is optional only to represent legacy local rows written before
/// an account existed; such orphans are reattached during pull.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    /// Stable global ID used for remote upserts and cross-device identity.
    pub id: ClassId,
    /// Owning account. `None` marks an orphan row awaiting reattachment.
    pub owner_id: Option<OwnerId>,
    /// Display name, unique among the owner's active classes.
    pub name: String,
    /// Soft delete tombstone, propagated to the remote on push.
    pub is_deleted: bool,
    /// Epoch milliseconds of soft deletion, when tombstoned.
    pub deleted_at: Option<i64>,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
    /// Last mutation timestamp in epoch milliseconds.
    pub updated_at: i64,
}

impl Class {
    /// Creates a new active class with a generated stable ID.
    pub fn new(owner_id: OwnerId, name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), owner_id, name)
    }

    /// Creates a class with a caller-provided stable ID.
    ///
    /// Used by pull, which must preserve remote identity instead of minting
    /// a new local id.
    pub fn with_id(id: ClassId, owner_id: OwnerId, name: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            id,
            owner_id: Some(owner_id),
            name: name.into(),
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks this class as softly deleted (tombstoned).
    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
        self.deleted_at = Some(now_ms());
    }

    /// Clears the tombstone.
    pub fn restore(&mut self) {
        self.is_deleted = false;
        self.deleted_at = None;
    }

    /// Returns whether this class should be considered visible/active.
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}
