//! Class repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the `classes` table.
//! - Own the delete cascade: tombstoning a class tombstones its active
//!   students in the same transaction, never its attendance history.
//!
//! # Invariants
//! - Rename updates the existing row in place; the id never changes.
//! - Listing is active-only by default, ordered by creation time.
//! - `upsert` lands rows by id so pull preserves remote identity.

use crate::model::class::{Class, ClassId, OwnerId};
use crate::repo::{
    bool_to_int, ensure_connection_ready, int_to_bool, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const CLASS_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    name,
    is_deleted,
    deleted_at,
    created_at,
    updated_at
FROM classes";

/// Repository interface for class persistence.
pub trait ClassRepository {
    /// Inserts a new class row and returns its stable id.
    fn create(&self, class: &Class) -> RepoResult<ClassId>;
    /// Renames an existing class in place. The id must not change.
    fn rename(&self, id: ClassId, new_name: &str) -> RepoResult<()>;
    /// Gets one class by id with optional tombstone visibility.
    fn get(&self, id: ClassId, include_deleted: bool) -> RepoResult<Option<Class>>;
    /// Finds the active class with this name for one owner.
    fn find_active_by_name(&self, owner: OwnerId, name: &str) -> RepoResult<Option<Class>>;
    /// Lists an owner's classes in creation order.
    fn list_for_owner(&self, owner: OwnerId, include_deleted: bool) -> RepoResult<Vec<Class>>;
    /// Tombstones a class and all of its active students in one transaction.
    /// Returns the number of students tombstoned. Attendance is untouched.
    fn soft_delete_cascade(&self, id: ClassId) -> RepoResult<u64>;
    /// Inserts or updates a row by id, preserving the caller's identity and
    /// the local `created_at` when the row already exists.
    fn upsert(&self, class: &Class) -> RepoResult<()>;
    /// Attaches classes without an owner to the given account.
    /// Returns the number of rows adopted.
    fn adopt_orphans(&self, owner: OwnerId) -> RepoResult<u64>;
}

/// SQLite-backed class repository.
pub struct SqliteClassRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteClassRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (
                    "classes",
                    &[
                        "id",
                        "owner_id",
                        "name",
                        "is_deleted",
                        "deleted_at",
                        "created_at",
                        "updated_at",
                    ],
                ),
                ("students", &["id", "class_id", "is_deleted"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl ClassRepository for SqliteClassRepository<'_> {
    fn create(&self, class: &Class) -> RepoResult<ClassId> {
        self.conn.execute(
            "INSERT INTO classes (
                id,
                owner_id,
                name,
                is_deleted,
                deleted_at,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                class.id.to_string(),
                class.owner_id.map(|owner| owner.to_string()),
                class.name.as_str(),
                bool_to_int(class.is_deleted),
                class.deleted_at,
                class.created_at,
                class.updated_at,
            ],
        )?;

        Ok(class.id)
    }

    fn rename(&self, id: ClassId, new_name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE classes
             SET
                name = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_deleted = 0;",
            params![id.to_string(), new_name],
        )?;

        if changed == 0 {
            return Err(RepoError::ClassNotFound(id));
        }

        Ok(())
    }

    fn get(&self, id: ClassId, include_deleted: bool) -> RepoResult<Option<Class>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CLASS_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR is_deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_class_row(row)?));
        }

        Ok(None)
    }

    fn find_active_by_name(&self, owner: OwnerId, name: &str) -> RepoResult<Option<Class>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CLASS_SELECT_SQL}
             WHERE owner_id = ?1
               AND name = ?2
               AND is_deleted = 0;"
        ))?;

        let mut rows = stmt.query(params![owner.to_string(), name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_class_row(row)?));
        }

        Ok(None)
    }

    fn list_for_owner(&self, owner: OwnerId, include_deleted: bool) -> RepoResult<Vec<Class>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CLASS_SELECT_SQL}
             WHERE owner_id = ?1
               AND (?2 = 1 OR is_deleted = 0)
             ORDER BY created_at ASC, id ASC;"
        ))?;

        let mut rows = stmt.query(params![owner.to_string(), bool_to_int(include_deleted)])?;
        let mut classes = Vec::new();
        while let Some(row) = rows.next()? {
            classes.push(parse_class_row(row)?);
        }

        Ok(classes)
    }

    fn soft_delete_cascade(&self, id: ClassId) -> RepoResult<u64> {
        let tx = self.conn.unchecked_transaction()?;

        let changed = tx.execute(
            "UPDATE classes
             SET
                is_deleted = 1,
                deleted_at = (strftime('%s', 'now') * 1000),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_deleted = 0;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::ClassNotFound(id));
        }

        let students = tx.execute(
            "UPDATE students
             SET
                is_deleted = 1,
                deleted_at = (strftime('%s', 'now') * 1000),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE class_id = ?1
               AND is_deleted = 0;",
            [id.to_string()],
        )?;

        tx.commit()?;
        Ok(students as u64)
    }

    fn upsert(&self, class: &Class) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO classes (
                id,
                owner_id,
                name,
                is_deleted,
                deleted_at,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                owner_id = excluded.owner_id,
                name = excluded.name,
                is_deleted = excluded.is_deleted,
                deleted_at = excluded.deleted_at,
                updated_at = excluded.updated_at;",
            params![
                class.id.to_string(),
                class.owner_id.map(|owner| owner.to_string()),
                class.name.as_str(),
                bool_to_int(class.is_deleted),
                class.deleted_at,
                class.created_at,
                class.updated_at,
            ],
        )?;

        Ok(())
    }

    fn adopt_orphans(&self, owner: OwnerId) -> RepoResult<u64> {
        let adopted = self.conn.execute(
            "UPDATE classes
             SET
                owner_id = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE owner_id IS NULL;",
            [owner.to_string()],
        )?;

        Ok(adopted as u64)
    }
}

fn parse_class_row(row: &Row<'_>) -> RepoResult<Class> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "classes", "id")?;

    let owner_id = match row.get::<_, Option<String>>("owner_id")? {
        Some(value) => Some(parse_uuid(&value, "classes", "owner_id")?),
        None => None,
    };

    let is_deleted = int_to_bool(row.get("is_deleted")?, "classes", "is_deleted")?;

    Ok(Class {
        id,
        owner_id,
        name: row.get("name")?,
        is_deleted,
        deleted_at: row.get("deleted_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
