//! Attendance repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist presence-only attendance rows keyed by (student, class, date).
//! - Own atomic day replacement: "save attendance for date D" deletes the
//!   day and inserts the new set in one transaction.
//!
//! # Invariants
//! - Absence is never stored; a day's row count equals its present count.
//! - Dates are persisted as ISO `YYYY-MM-DD` text, so lexical order is
//!   calendar order.
//! - Day deletion is a hard delete; attendance carries no tombstones.

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::class::ClassId;
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const ATTENDANCE_SELECT_SQL: &str = "SELECT
    id,
    student_id,
    class_id,
    date,
    status,
    notes,
    created_at,
    updated_at
FROM attendance";

/// Repository interface for attendance persistence.
pub trait AttendanceRepository {
    /// Replaces every row of one (class, date) with the provided set in one
    /// transaction. Passing an empty set clears the day.
    fn replace_day(
        &self,
        class_id: ClassId,
        date: NaiveDate,
        records: &[AttendanceRecord],
    ) -> RepoResult<()>;
    /// Lists the rows of one (class, date).
    fn list_for_day(&self, class_id: ClassId, date: NaiveDate)
        -> RepoResult<Vec<AttendanceRecord>>;
    /// Lists every row of one class across all dates.
    fn list_for_class(&self, class_id: ClassId) -> RepoResult<Vec<AttendanceRecord>>;
    /// Lists the distinct dates with at least one row, newest first.
    fn list_dates(&self, class_id: ClassId) -> RepoResult<Vec<NaiveDate>>;
    /// Hard-deletes every row of one (class, date). Returns rows removed.
    fn delete_day(&self, class_id: ClassId, date: NaiveDate) -> RepoResult<u64>;
    /// Inserts or updates a row by id (pull path).
    fn upsert(&self, record: &AttendanceRecord) -> RepoResult<()>;
}

/// SQLite-backed attendance repository.
pub struct SqliteAttendanceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttendanceRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[(
                "attendance",
                &[
                    "id",
                    "student_id",
                    "class_id",
                    "date",
                    "status",
                    "notes",
                    "created_at",
                    "updated_at",
                ],
            )],
        )?;
        Ok(Self { conn })
    }

    fn insert(&self, conn: &Connection, record: &AttendanceRecord) -> RepoResult<()> {
        conn.execute(
            "INSERT INTO attendance (
                id,
                student_id,
                class_id,
                date,
                status,
                notes,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                record.id.to_string(),
                record.student_id.to_string(),
                record.class_id.to_string(),
                record.date.to_string(),
                status_to_db(record.status),
                record.notes.as_deref(),
                record.created_at,
                record.updated_at,
            ],
        )?;
        Ok(())
    }
}

impl AttendanceRepository for SqliteAttendanceRepository<'_> {
    fn replace_day(
        &self,
        class_id: ClassId,
        date: NaiveDate,
        records: &[AttendanceRecord],
    ) -> RepoResult<()> {
        for record in records {
            if record.class_id != class_id || record.date != date {
                return Err(RepoError::InvalidData(format!(
                    "record {} targets ({}, {}), expected ({class_id}, {date})",
                    record.id, record.class_id, record.date
                )));
            }
        }

        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM attendance WHERE class_id = ?1 AND date = ?2;",
            params![class_id.to_string(), date.to_string()],
        )?;

        for record in records {
            self.insert(&tx, record)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn list_for_day(
        &self,
        class_id: ClassId,
        date: NaiveDate,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ATTENDANCE_SELECT_SQL}
             WHERE class_id = ?1
               AND date = ?2
             ORDER BY student_id ASC;"
        ))?;

        let mut rows = stmt.query(params![class_id.to_string(), date.to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_attendance_row(row)?);
        }

        Ok(records)
    }

    fn list_for_class(&self, class_id: ClassId) -> RepoResult<Vec<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ATTENDANCE_SELECT_SQL}
             WHERE class_id = ?1
             ORDER BY date ASC, student_id ASC;"
        ))?;

        let mut rows = stmt.query([class_id.to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_attendance_row(row)?);
        }

        Ok(records)
    }

    fn list_dates(&self, class_id: ClassId) -> RepoResult<Vec<NaiveDate>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT date
             FROM attendance
             WHERE class_id = ?1
             ORDER BY date DESC;",
        )?;

        let mut rows = stmt.query([class_id.to_string()])?;
        let mut dates = Vec::new();
        while let Some(row) = rows.next()? {
            let text: String = row.get(0)?;
            dates.push(parse_date(&text)?);
        }

        Ok(dates)
    }

    fn delete_day(&self, class_id: ClassId, date: NaiveDate) -> RepoResult<u64> {
        let removed = self.conn.execute(
            "DELETE FROM attendance WHERE class_id = ?1 AND date = ?2;",
            params![class_id.to_string(), date.to_string()],
        )?;

        Ok(removed as u64)
    }

    fn upsert(&self, record: &AttendanceRecord) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO attendance (
                id,
                student_id,
                class_id,
                date,
                status,
                notes,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                student_id = excluded.student_id,
                class_id = excluded.class_id,
                date = excluded.date,
                status = excluded.status,
                notes = excluded.notes,
                updated_at = excluded.updated_at
            ON CONFLICT(student_id, class_id, date) DO UPDATE SET
                status = excluded.status,
                notes = excluded.notes,
                updated_at = excluded.updated_at;",
            params![
                record.id.to_string(),
                record.student_id.to_string(),
                record.class_id.to_string(),
                record.date.to_string(),
                status_to_db(record.status),
                record.notes.as_deref(),
                record.created_at,
                record.updated_at,
            ],
        )?;

        Ok(())
    }
}

fn parse_attendance_row(row: &Row<'_>) -> RepoResult<AttendanceRecord> {
    let id_text: String = row.get("id")?;
    let student_text: String = row.get("student_id")?;
    let class_text: String = row.get("class_id")?;
    let date_text: String = row.get("date")?;
    let status_text: String = row.get("status")?;

    let status = parse_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in attendance.status"
        ))
    })?;

    Ok(AttendanceRecord {
        id: parse_uuid(&id_text, "attendance", "id")?,
        student_id: parse_uuid(&student_text, "attendance", "student_id")?,
        class_id: parse_uuid(&class_text, "attendance", "class_id")?,
        date: parse_date(&date_text)?,
        status,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_date(value: &str) -> RepoResult<NaiveDate> {
    value.parse::<NaiveDate>().map_err(|_| {
        RepoError::InvalidData(format!("invalid date value `{value}` in attendance.date"))
    })
}

fn status_to_db(status: AttendanceStatus) -> &'static str {
    match status {
        AttendanceStatus::Present => "present",
        AttendanceStatus::Late => "late",
    }
}

fn parse_status(value: &str) -> Option<AttendanceStatus> {
    match value {
        "present" => Some(AttendanceStatus::Present),
        "late" => Some(AttendanceStatus::Late),
        _ => None,
    }
}
