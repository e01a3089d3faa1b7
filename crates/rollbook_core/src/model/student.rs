//! Student domain model.
//!
//! # Invariants
//! - `id` is stable for the student's lifetime.
//! - Among active students of one class, `roll_number` is unique.
//! - Lifecycle mirrors `Class`: deletion is a soft-delete tombstone.

use crate::model::class::ClassId;
use crate::model::now_ms;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a student.
pub type StudentId = Uuid;

/// One student enrolled in exactly one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Stable global ID used for remote upserts.
    pub id: StudentId,
    /// Owning class; ownership by an account is transitive through it.
    pub class_id: ClassId,
    /// Roll number, unique among the class's active students.
    pub roll_number: String,
    /// Display name.
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

impl Student {
    /// Creates a new active student with a generated stable ID.
    pub fn new(class_id: ClassId, roll_number: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), class_id, roll_number, name)
    }

    /// Creates a student with a caller-provided stable ID (pull path).
    pub fn with_id(
        id: StudentId,
        class_id: ClassId,
        roll_number: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let now = now_ms();
        Self {
            id,
            class_id,
            roll_number: roll_number.into(),
            name: name.into(),
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks this student as softly deleted (tombstoned).
    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
        self.deleted_at = Some(now_ms());
    }

    /// Clears the tombstone.
    pub fn restore(&mut self) {
        self.is_deleted = false;
        self.deleted_at = None;
    }

    /// Returns whether this student should be considered visible/active.
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

#[cfg(test)]
mod tests {
    use super::Student;
    use uuid::Uuid;

    #[test]
    fn new_student_starts_active_in_class() {
        let class_id = Uuid::new_v4();
        let student = Student::new(class_id, "R1", "Alice");

        assert!(student.is_active());
        assert_eq!(student.class_id, class_id);
        assert_eq!(student.roll_number, "R1");
    }

    #[test]
    fn soft_delete_round_trip() {
        let mut student = Student::new(Uuid::new_v4(), "R2", "Bob");
        student.soft_delete();
        assert!(!student.is_active());
        student.restore();
        assert!(student.is_active());
    }
}
