//! Attendance domain model.
//!
//! # Invariants
//! - A row's existence denotes presence for that calendar date; an absent
//!   student simply has no row. This is the central storage optimization:
//!   only the attended share of the student-by-day matrix is materialized.
//! - At most one row exists per `(student_id, class_id, date)`.
//! - Attendance has no soft delete: removing a day hard-deletes its rows,
//!   while class/student deletion leaves attendance history untouched.

use crate::model::class::ClassId;
use crate::model::now_ms;
use crate::model::student::StudentId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for an attendance record.
pub type RecordId = Uuid;

/// Attendance standing for a materialized (present) row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Attended on time.
    Present,
    /// Attended late.
    Late,
}

/// One presence row for a student on a calendar date.
///
/// `class_id` is denormalized from the student so attendance can be filtered
/// by ownership without a join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Stable global ID used for remote upserts.
    pub id: RecordId,
    /// Student this presence row belongs to.
    pub student_id: StudentId,
    /// Denormalized owning class for query locality.
    pub class_id: ClassId,
    /// Calendar date with no time component.
    pub date: NaiveDate,
    /// Presence standing.
    pub status: AttendanceStatus,
    /// Optional free-form note.
    pub notes: Option<String>,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
    /// Last mutation timestamp in epoch milliseconds.
    pub updated_at: i64,
}

impl AttendanceRecord {
    /// Creates a presence row with a generated stable ID.
    pub fn new(
        student_id: StudentId,
        class_id: ClassId,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), student_id, class_id, date, status)
    }

    /// Creates a presence row with a caller-provided stable ID (pull path,
    /// and day replacement that keeps an unchanged row's identity).
    pub fn with_id(
        id: RecordId,
        student_id: StudentId,
        class_id: ClassId,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Self {
        let now = now_ms();
        Self {
            id,
            student_id,
            class_id,
            date,
            status,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AttendanceRecord, AttendanceStatus};
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn new_record_carries_denormalized_class() {
        let class_id = Uuid::new_v4();
        let student_id = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();

        let record = AttendanceRecord::new(student_id, class_id, date, AttendanceStatus::Present);
        assert_eq!(record.class_id, class_id);
        assert_eq!(record.student_id, student_id);
        assert_eq!(record.date, date);
        assert!(record.notes.is_none());
    }

    #[test]
    fn with_id_preserves_caller_identity() {
        let id = Uuid::new_v4();
        let record = AttendanceRecord::with_id(
            id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            AttendanceStatus::Late,
        );
        assert_eq!(record.id, id);
        assert_eq!(record.status, AttendanceStatus::Late);
    }
}
