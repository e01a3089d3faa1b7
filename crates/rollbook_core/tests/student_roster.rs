use rollbook_core::db::open_db_in_memory;
use rollbook_core::{
    DomainError, RosterEntry, RosterService, SqliteClassRepository, SqliteStudentRepository,
    StaticSession, StudentRepository,
};
use std::sync::Arc;
use uuid::Uuid;

fn service<'conn>(
    conn: &'conn rusqlite::Connection,
) -> RosterService<SqliteClassRepository<'conn>, SqliteStudentRepository<'conn>> {
    RosterService::new(
        SqliteClassRepository::try_new(conn).unwrap(),
        SqliteStudentRepository::try_new(conn).unwrap(),
        Arc::new(StaticSession::signed_in(Uuid::new_v4())),
    )
}

#[test]
fn add_and_list_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);

    let class_id = svc.create_class("Math 7B").unwrap();
    let id = svc.add_student(class_id, "01", "Ada").unwrap();

    let roster = svc.get_students(class_id).unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].id, id);
    assert_eq!(roster[0].roll_number, "01");
    assert_eq!(roster[0].name, "Ada");
}

#[test]
fn add_to_unknown_class_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);

    let err = svc.add_student(Uuid::new_v4(), "01", "Ada").unwrap_err();
    assert!(matches!(err, DomainError::ClassNotFound(_)));
}

#[test]
fn duplicate_active_roll_number_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);

    let class_id = svc.create_class("Math 7B").unwrap();
    svc.add_student(class_id, "01", "Ada").unwrap();

    let err = svc.add_student(class_id, "01", "Grace").unwrap_err();
    assert!(matches!(err, DomainError::DuplicateRollNumber(roll) if roll == "01"));
}

#[test]
fn same_roll_number_is_allowed_across_classes() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);

    let math = svc.create_class("Math 7B").unwrap();
    let history = svc.create_class("History").unwrap();

    svc.add_student(math, "01", "Ada").unwrap();
    svc.add_student(history, "01", "Grace").unwrap();

    assert_eq!(svc.get_students(math).unwrap().len(), 1);
    assert_eq!(svc.get_students(history).unwrap().len(), 1);
}

#[test]
fn deleted_roll_number_is_reusable() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);

    let class_id = svc.create_class("Math 7B").unwrap();
    let first = svc.add_student(class_id, "01", "Ada").unwrap();
    svc.delete_student(class_id, "01").unwrap();

    let second = svc.add_student(class_id, "01", "Grace").unwrap();
    assert_ne!(first, second);

    let roster = svc.get_students(class_id).unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].name, "Grace");
}

#[test]
fn update_student_name_keeps_identifier_stable() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);

    let class_id = svc.create_class("Math 7B").unwrap();
    let id = svc.add_student(class_id, "01", "Ada").unwrap();

    svc.update_student_name(class_id, "01", "Ada L.").unwrap();

    let roster = svc.get_students(class_id).unwrap();
    assert_eq!(roster[0].id, id);
    assert_eq!(roster[0].name, "Ada L.");
}

#[test]
fn update_of_unknown_roll_number_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);

    let class_id = svc.create_class("Math 7B").unwrap();
    let err = svc.update_student_name(class_id, "99", "Ghost").unwrap_err();
    assert!(matches!(err, DomainError::StudentNotFound(roll) if roll == "99"));
}

#[test]
fn set_students_replaces_active_roster_atomically() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);
    let students = SqliteStudentRepository::try_new(&conn).unwrap();

    let class_id = svc.create_class("Math 7B").unwrap();
    svc.add_student(class_id, "01", "Ada").unwrap();
    svc.add_student(class_id, "02", "Grace").unwrap();

    let ids = svc
        .set_students(
            class_id,
            &[
                RosterEntry {
                    roll_number: "10".to_string(),
                    name: "Edsger".to_string(),
                },
                RosterEntry {
                    roll_number: "11".to_string(),
                    name: "Barbara".to_string(),
                },
                RosterEntry {
                    roll_number: "12".to_string(),
                    name: "Donald".to_string(),
                },
            ],
        )
        .unwrap();
    assert_eq!(ids.len(), 3);

    let mut active: Vec<String> = svc
        .get_students(class_id)
        .unwrap()
        .into_iter()
        .map(|student| student.roll_number)
        .collect();
    active.sort();
    assert_eq!(active, vec!["10", "11", "12"]);

    // The replaced students stay as tombstones, not deleted rows.
    let all = students.list_for_class(class_id, true).unwrap();
    assert_eq!(all.len(), 5);
    assert_eq!(all.iter().filter(|student| student.is_deleted).count(), 2);
}

#[test]
fn set_students_rejects_duplicate_roll_numbers_in_input() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);

    let class_id = svc.create_class("Math 7B").unwrap();
    svc.add_student(class_id, "01", "Ada").unwrap();

    let err = svc
        .set_students(
            class_id,
            &[
                RosterEntry {
                    roll_number: "10".to_string(),
                    name: "Edsger".to_string(),
                },
                RosterEntry {
                    roll_number: "10".to_string(),
                    name: "Barbara".to_string(),
                },
            ],
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::DuplicateRollNumber(roll) if roll == "10"));

    // The failed replacement left the previous roster untouched.
    let roster = svc.get_students(class_id).unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].roll_number, "01");
}

#[test]
fn set_students_with_empty_roster_clears_the_class() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);

    let class_id = svc.create_class("Math 7B").unwrap();
    svc.add_student(class_id, "01", "Ada").unwrap();

    svc.set_students(class_id, &[]).unwrap();
    assert!(svc.get_students(class_id).unwrap().is_empty());
}

#[test]
fn delete_student_hides_row_but_keeps_history_visibility() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);
    let students = SqliteStudentRepository::try_new(&conn).unwrap();

    let class_id = svc.create_class("Math 7B").unwrap();
    let id = svc.add_student(class_id, "01", "Ada").unwrap();
    svc.delete_student(class_id, "01").unwrap();

    assert!(svc.get_students(class_id).unwrap().is_empty());

    let tombstone = students.get(id, true).unwrap().unwrap();
    assert!(tombstone.is_deleted);
    assert!(tombstone.deleted_at.is_some());
}

#[test]
fn delete_of_unknown_roll_number_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);

    let class_id = svc.create_class("Math 7B").unwrap();
    let err = svc.delete_student(class_id, "99").unwrap_err();
    assert!(matches!(err, DomainError::StudentNotFound(roll) if roll == "99"));
}

#[test]
fn roster_of_unknown_class_is_empty_not_an_error() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn);

    assert!(svc.get_students(Uuid::new_v4()).unwrap().is_empty());
}
