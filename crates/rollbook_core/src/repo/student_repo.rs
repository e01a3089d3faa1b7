//! Student repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the `students` table, scoped to a class.
//! - Own atomic roster replacement (`replace_roster`) used to seed a class
//!   from a template.
//!
//! # Invariants
//! - Listing is active-only by default, ordered by creation time.
//! - `replace_roster` tombstones the active roster and inserts the new one
//!   in a single transaction.
//! - `upsert` lands rows by id so pull preserves remote identity.

use crate::model::class::ClassId;
use crate::model::student::{Student, StudentId};
use crate::repo::{
    bool_to_int, ensure_connection_ready, int_to_bool, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const STUDENT_SELECT_SQL: &str = "SELECT
    id,
    class_id,
    roll_number,
    name,
    is_deleted,
    deleted_at,
    created_at,
    updated_at
FROM students";

/// Repository interface for student persistence.
pub trait StudentRepository {
    /// Inserts a new student row and returns its stable id.
    fn create(&self, student: &Student) -> RepoResult<StudentId>;
    /// Gets one student by id with optional tombstone visibility.
    fn get(&self, id: StudentId, include_deleted: bool) -> RepoResult<Option<Student>>;
    /// Finds the active student with this roll number in one class.
    fn find_active_by_roll(&self, class_id: ClassId, roll_number: &str)
        -> RepoResult<Option<Student>>;
    /// Lists a class's students in creation order.
    fn list_for_class(&self, class_id: ClassId, include_deleted: bool)
        -> RepoResult<Vec<Student>>;
    /// Renames an existing active student in place. The id must not change.
    fn rename(&self, id: StudentId, new_name: &str) -> RepoResult<()>;
    /// Tombstones one active student.
    fn soft_delete(&self, id: StudentId) -> RepoResult<()>;
    /// Replaces the active roster of a class in one transaction: tombstones
    /// every active student, then inserts the provided roster.
    fn replace_roster(&self, class_id: ClassId, roster: &[Student]) -> RepoResult<()>;
    /// Inserts or updates a row by id, preserving the caller's identity and
    /// the local `created_at` when the row already exists.
    fn upsert(&self, student: &Student) -> RepoResult<()>;
}

/// SQLite-backed student repository.
pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[(
                "students",
                &[
                    "id",
                    "class_id",
                    "roll_number",
                    "name",
                    "is_deleted",
                    "deleted_at",
                    "created_at",
                    "updated_at",
                ],
            )],
        )?;
        Ok(Self { conn })
    }

    fn insert(&self, conn: &Connection, student: &Student) -> RepoResult<()> {
        conn.execute(
            "INSERT INTO students (
                id,
                class_id,
                roll_number,
                name,
                is_deleted,
                deleted_at,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                student.id.to_string(),
                student.class_id.to_string(),
                student.roll_number.as_str(),
                student.name.as_str(),
                bool_to_int(student.is_deleted),
                student.deleted_at,
                student.created_at,
                student.updated_at,
            ],
        )?;
        Ok(())
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn create(&self, student: &Student) -> RepoResult<StudentId> {
        self.insert(self.conn, student)?;
        Ok(student.id)
    }

    fn get(&self, id: StudentId, include_deleted: bool) -> RepoResult<Option<Student>> {
        let mut stmt = self.conn.prepare(&format!(
            "{STUDENT_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR is_deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_student_row(row)?));
        }

        Ok(None)
    }

    fn find_active_by_roll(
        &self,
        class_id: ClassId,
        roll_number: &str,
    ) -> RepoResult<Option<Student>> {
        let mut stmt = self.conn.prepare(&format!(
            "{STUDENT_SELECT_SQL}
             WHERE class_id = ?1
               AND roll_number = ?2
               AND is_deleted = 0;"
        ))?;

        let mut rows = stmt.query(params![class_id.to_string(), roll_number])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_student_row(row)?));
        }

        Ok(None)
    }

    fn list_for_class(
        &self,
        class_id: ClassId,
        include_deleted: bool,
    ) -> RepoResult<Vec<Student>> {
        let mut stmt = self.conn.prepare(&format!(
            "{STUDENT_SELECT_SQL}
             WHERE class_id = ?1
               AND (?2 = 1 OR is_deleted = 0)
             ORDER BY created_at ASC, id ASC;"
        ))?;

        let mut rows = stmt.query(params![class_id.to_string(), bool_to_int(include_deleted)])?;
        let mut students = Vec::new();
        while let Some(row) = rows.next()? {
            students.push(parse_student_row(row)?);
        }

        Ok(students)
    }

    fn rename(&self, id: StudentId, new_name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE students
             SET
                name = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_deleted = 0;",
            params![id.to_string(), new_name],
        )?;

        if changed == 0 {
            return Err(RepoError::StudentNotFound(id));
        }

        Ok(())
    }

    fn soft_delete(&self, id: StudentId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE students
             SET
                is_deleted = 1,
                deleted_at = (strftime('%s', 'now') * 1000),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_deleted = 0;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::StudentNotFound(id));
        }

        Ok(())
    }

    fn replace_roster(&self, class_id: ClassId, roster: &[Student]) -> RepoResult<()> {
        for student in roster {
            if student.class_id != class_id {
                return Err(RepoError::InvalidData(format!(
                    "roster student {} belongs to class {}, expected {class_id}",
                    student.id, student.class_id
                )));
            }
        }

        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "UPDATE students
             SET
                is_deleted = 1,
                deleted_at = (strftime('%s', 'now') * 1000),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE class_id = ?1
               AND is_deleted = 0;",
            [class_id.to_string()],
        )?;

        for student in roster {
            self.insert(&tx, student)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn upsert(&self, student: &Student) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO students (
                id,
                class_id,
                roll_number,
                name,
                is_deleted,
                deleted_at,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                class_id = excluded.class_id,
                roll_number = excluded.roll_number,
                name = excluded.name,
                is_deleted = excluded.is_deleted,
                deleted_at = excluded.deleted_at,
                updated_at = excluded.updated_at;",
            params![
                student.id.to_string(),
                student.class_id.to_string(),
                student.roll_number.as_str(),
                student.name.as_str(),
                bool_to_int(student.is_deleted),
                student.deleted_at,
                student.created_at,
                student.updated_at,
            ],
        )?;

        Ok(())
    }
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<Student> {
    let id_text: String = row.get("id")?;
    let class_text: String = row.get("class_id")?;

    Ok(Student {
        id: parse_uuid(&id_text, "students", "id")?,
        class_id: parse_uuid(&class_text, "students", "class_id")?,
        roll_number: row.get("roll_number")?,
        name: row.get("name")?,
        is_deleted: int_to_bool(row.get("is_deleted")?, "students", "is_deleted")?,
        deleted_at: row.get("deleted_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
