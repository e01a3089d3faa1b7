use rollbook_core::db::migrations::latest_version;
use rollbook_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "classes");
    assert_table_exists(&conn, "students");
    assert_table_exists(&conn, "attendance");
    assert_table_exists(&conn, "sync_state");
}

#[test]
fn sync_state_is_seeded_with_single_empty_row() {
    let conn = open_db_in_memory().unwrap();

    let (count, last): (i64, Option<i64>) = conn
        .query_row(
            "SELECT COUNT(*), MAX(last_synced_at) FROM sync_state;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(count, 1);
    assert!(last.is_none());
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rollbook.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "classes");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn attendance_rejects_unknown_status_values() {
    let conn = open_db_in_memory().unwrap();

    conn.execute(
        "INSERT INTO classes (id, owner_id, name, is_deleted, created_at, updated_at)
         VALUES ('c1', NULL, 'Math', 0, 1, 1);",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO students (id, class_id, roll_number, name, is_deleted, created_at, updated_at)
         VALUES ('s1', 'c1', '01', 'Ada', 0, 1, 1);",
        [],
    )
    .unwrap();

    let err = conn
        .execute(
            "INSERT INTO attendance
                 (id, student_id, class_id, date, status, created_at, updated_at)
             VALUES ('a1', 's1', 'c1', '2025-03-10', 'absent', 1, 1);",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("CHECK"));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
