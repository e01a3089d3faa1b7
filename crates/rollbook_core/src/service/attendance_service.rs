//! Attendance use-case service.
//!
//! # Responsibility
//! - Provide the per-date attendance API keyed by roll numbers, translating
//!   to presence-only rows keyed by student id.
//! - Keep "save day" a full, idempotent replacement of that (class, date).
//!
//! # Invariants
//! - Saving never writes an "absent" row: row count equals present count.
//! - Saving the same set twice yields the same stored row set; unchanged
//!   students keep their record identity across saves.
//! - Roll numbers that do not resolve to an active student are skipped,
//!   not errors; the roster is the source of truth.

use crate::model::attendance::{AttendanceRecord, AttendanceStatus, RecordId};
use crate::model::class::ClassId;
use crate::model::student::StudentId;
use crate::repo::attendance_repo::AttendanceRepository;
use crate::repo::student_repo::StudentRepository;
use crate::service::DomainResult;
use chrono::NaiveDate;
use log::{info, warn};
use std::collections::{BTreeSet, HashMap};

/// Request model for one present student in `save_attendance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceEntry {
    /// Roll number within the class's active roster.
    pub roll_number: String,
    /// Presence standing for the day.
    pub status: AttendanceStatus,
    /// Optional free-form note.
    pub notes: Option<String>,
}

impl AttendanceEntry {
    /// An on-time presence mark.
    pub fn present(roll_number: impl Into<String>) -> Self {
        Self {
            roll_number: roll_number.into(),
            status: AttendanceStatus::Present,
            notes: None,
        }
    }

    /// A late presence mark.
    pub fn late(roll_number: impl Into<String>) -> Self {
        Self {
            roll_number: roll_number.into(),
            status: AttendanceStatus::Late,
            notes: None,
        }
    }
}

/// Use-case service for per-date attendance.
pub struct AttendanceService<S: StudentRepository, A: AttendanceRepository> {
    students: S,
    attendance: A,
}

impl<S: StudentRepository, A: AttendanceRepository> AttendanceService<S, A> {
    /// Creates a service over the provided repositories.
    pub fn new(students: S, attendance: A) -> Self {
        Self {
            students,
            attendance,
        }
    }

    /// Replaces the attendance of one (class, date) with the provided
    /// present set, as a single atomic batch. Absent students get no row.
    ///
    /// Returns the number of rows stored. Entries whose roll number does
    /// not resolve to an active student are skipped with a warning; saving
    /// for an unknown class stores nothing.
    pub fn save_attendance(
        &self,
        class_id: ClassId,
        date: NaiveDate,
        entries: &[AttendanceEntry],
    ) -> DomainResult<usize> {
        let roster = self.students.list_for_class(class_id, false)?;
        let by_roll: HashMap<&str, StudentId> = roster
            .iter()
            .map(|student| (student.roll_number.as_str(), student.id))
            .collect();

        // Unchanged students keep their record id across saves, so a re-push
        // after editing a day upserts instead of accumulating remote rows.
        let existing: HashMap<StudentId, (RecordId, i64)> = self
            .attendance
            .list_for_day(class_id, date)?
            .into_iter()
            .map(|record| (record.student_id, (record.id, record.created_at)))
            .collect();

        let mut by_student: HashMap<StudentId, AttendanceRecord> = HashMap::new();
        for entry in entries {
            let Some(&student_id) = by_roll.get(entry.roll_number.as_str()) else {
                warn!(
                    "event=attendance_save module=service status=skip class_id={class_id} date={date} reason=unknown_roll roll={}",
                    entry.roll_number
                );
                continue;
            };

            let mut record = match existing.get(&student_id) {
                Some(&(id, created_at)) => {
                    let mut record =
                        AttendanceRecord::with_id(id, student_id, class_id, date, entry.status);
                    record.created_at = created_at;
                    record
                }
                None => AttendanceRecord::new(student_id, class_id, date, entry.status),
            };
            record.notes = entry.notes.clone();
            by_student.insert(student_id, record);
        }

        let records: Vec<AttendanceRecord> = by_student.into_values().collect();
        self.attendance.replace_day(class_id, date, &records)?;

        info!(
            "event=attendance_save module=service status=ok class_id={class_id} date={date} rows={}",
            records.len()
        );
        Ok(records.len())
    }

    /// Returns the roll numbers present on one (class, date). Absence is the
    /// default for any roll number not in the returned set.
    pub fn get_attendance(
        &self,
        class_id: ClassId,
        date: NaiveDate,
    ) -> DomainResult<BTreeSet<String>> {
        // Tombstoned students stay resolvable: their history outlives them.
        let by_id: HashMap<StudentId, String> = self
            .students
            .list_for_class(class_id, true)?
            .into_iter()
            .map(|student| (student.id, student.roll_number))
            .collect();

        let mut present = BTreeSet::new();
        for record in self.attendance.list_for_day(class_id, date)? {
            match by_id.get(&record.student_id) {
                Some(roll) => {
                    present.insert(roll.clone());
                }
                None => warn!(
                    "event=attendance_read module=service status=skip class_id={class_id} date={date} reason=unknown_student student_id={}",
                    record.student_id
                ),
            }
        }

        Ok(present)
    }

    /// Returns the full rows of one (class, date) for callers that need
    /// status and notes, not just presence.
    pub fn get_day_records(
        &self,
        class_id: ClassId,
        date: NaiveDate,
    ) -> DomainResult<Vec<AttendanceRecord>> {
        Ok(self.attendance.list_for_day(class_id, date)?)
    }

    /// Returns the distinct dates with at least one record, newest first.
    pub fn get_attendance_dates(&self, class_id: ClassId) -> DomainResult<Vec<NaiveDate>> {
        Ok(self.attendance.list_dates(class_id)?)
    }

    /// Hard-deletes every record of one (class, date). Unlike class/student
    /// deletion this is not a soft delete. Returns rows removed; deleting a
    /// day with no rows is a no-op.
    pub fn delete_attendance(&self, class_id: ClassId, date: NaiveDate) -> DomainResult<u64> {
        let removed = self.attendance.delete_day(class_id, date)?;
        info!(
            "event=attendance_delete module=service status=ok class_id={class_id} date={date} rows={removed}"
        );
        Ok(removed)
    }
}
