use rollbook_core::db::open_db_in_memory;
use rollbook_core::{
    Class, ClassRepository, DomainError, RepoError, RosterService, SqliteClassRepository,
    SqliteStudentRepository, StaticSession, StudentRepository,
};
use std::sync::Arc;
use uuid::Uuid;

fn service<'conn>(
    conn: &'conn rusqlite::Connection,
    owner: Uuid,
) -> RosterService<SqliteClassRepository<'conn>, SqliteStudentRepository<'conn>> {
    RosterService::new(
        SqliteClassRepository::try_new(conn).unwrap(),
        SqliteStudentRepository::try_new(conn).unwrap(),
        Arc::new(StaticSession::signed_in(owner)),
    )
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let svc = service(&conn, owner);

    let id = svc.create_class("Math 7B").unwrap();

    let class = svc.find_class("Math 7B").unwrap().unwrap();
    assert_eq!(class.id, id);
    assert_eq!(class.owner_id, Some(owner));
    assert!(class.is_active());
}

#[test]
fn create_without_session_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let svc = RosterService::new(
        SqliteClassRepository::try_new(&conn).unwrap(),
        SqliteStudentRepository::try_new(&conn).unwrap(),
        Arc::new(StaticSession::signed_out()),
    );

    let err = svc.create_class("Math 7B").unwrap_err();
    assert!(matches!(err, DomainError::NotAuthenticated));
}

#[test]
fn duplicate_active_name_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn, Uuid::new_v4());

    svc.create_class("Math 7B").unwrap();
    let err = svc.create_class("Math 7B").unwrap_err();
    assert!(matches!(err, DomainError::DuplicateName(name) if name == "Math 7B"));
}

#[test]
fn same_name_is_allowed_across_owners() {
    let conn = open_db_in_memory().unwrap();
    let svc_a = service(&conn, Uuid::new_v4());
    let svc_b = service(&conn, Uuid::new_v4());

    svc_a.create_class("Math 7B").unwrap();
    svc_b.create_class("Math 7B").unwrap();

    assert_eq!(svc_a.get_classes().unwrap().len(), 1);
    assert_eq!(svc_b.get_classes().unwrap().len(), 1);
}

#[test]
fn rename_keeps_identifier_stable() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn, Uuid::new_v4());

    let id = svc.create_class("Math 7B").unwrap();
    svc.rename_class("Math 7B", "Math 8A").unwrap();

    assert!(svc.find_class("Math 7B").unwrap().is_none());
    let renamed = svc.find_class("Math 8A").unwrap().unwrap();
    assert_eq!(renamed.id, id);
}

#[test]
fn rename_to_current_name_is_a_noop() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn, Uuid::new_v4());

    svc.create_class("Math 7B").unwrap();
    svc.rename_class("Math 7B", "Math 7B").unwrap();
    assert!(svc.find_class("Math 7B").unwrap().is_some());
}

#[test]
fn rename_to_existing_active_name_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn, Uuid::new_v4());

    svc.create_class("Math 7B").unwrap();
    svc.create_class("History").unwrap();

    let err = svc.rename_class("History", "Math 7B").unwrap_err();
    assert!(matches!(err, DomainError::DuplicateName(name) if name == "Math 7B"));
}

#[test]
fn rename_of_unknown_class_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn, Uuid::new_v4());

    let err = svc.rename_class("Ghost", "Real").unwrap_err();
    assert!(matches!(err, DomainError::ClassNotFound(name) if name == "Ghost"));
}

#[test]
fn delete_hides_class_but_keeps_tombstone_row() {
    let conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let svc = service(&conn, owner);
    let repo = SqliteClassRepository::try_new(&conn).unwrap();

    let id = svc.create_class("Math 7B").unwrap();
    svc.delete_class("Math 7B").unwrap();

    assert!(svc.find_class("Math 7B").unwrap().is_none());
    assert!(svc.get_classes().unwrap().is_empty());

    // Tombstone stays recoverable and push-visible.
    let tombstone = repo.get(id, true).unwrap().unwrap();
    assert!(tombstone.is_deleted);
    assert!(tombstone.deleted_at.is_some());
}

#[test]
fn deleted_name_is_reusable_for_a_new_class() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn, Uuid::new_v4());

    let first = svc.create_class("Math 7B").unwrap();
    svc.delete_class("Math 7B").unwrap();

    let second = svc.create_class("Math 7B").unwrap();
    assert_ne!(first, second);
    assert_eq!(svc.find_class("Math 7B").unwrap().unwrap().id, second);
}

#[test]
fn delete_cascades_tombstone_to_active_students() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn, Uuid::new_v4());
    let students = SqliteStudentRepository::try_new(&conn).unwrap();

    let class_id = svc.create_class("Math 7B").unwrap();
    svc.add_student(class_id, "01", "Ada").unwrap();
    svc.add_student(class_id, "02", "Grace").unwrap();
    svc.delete_student(class_id, "02").unwrap();

    let tombstoned = svc.delete_class("Math 7B").unwrap();
    assert_eq!(tombstoned, 1);

    let all = students.list_for_class(class_id, true).unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|student| student.is_deleted));
}

#[test]
fn delete_of_unknown_class_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn, Uuid::new_v4());

    let err = svc.delete_class("Ghost").unwrap_err();
    assert!(matches!(err, DomainError::ClassNotFound(name) if name == "Ghost"));
}

#[test]
fn get_classes_lists_active_names_only() {
    let conn = open_db_in_memory().unwrap();
    let svc = service(&conn, Uuid::new_v4());

    svc.create_class("Math 7B").unwrap();
    svc.create_class("History").unwrap();
    svc.create_class("Science").unwrap();
    svc.delete_class("History").unwrap();

    let mut names = svc.get_classes().unwrap();
    names.sort();
    assert_eq!(names, vec!["Math 7B".to_string(), "Science".to_string()]);
}

#[test]
fn list_for_owner_orders_by_creation_time() {
    let conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let repo = SqliteClassRepository::try_new(&conn).unwrap();

    let mut older = Class::new(owner, "Older");
    older.created_at = 1_000;
    let mut newer = Class::new(owner, "Newer");
    newer.created_at = 2_000;

    repo.create(&newer).unwrap();
    repo.create(&older).unwrap();

    let listed = repo.list_for_owner(owner, false).unwrap();
    let names: Vec<&str> = listed.iter().map(|class| class.name.as_str()).collect();
    assert_eq!(names, vec!["Older", "Newer"]);
}

#[test]
fn repo_rename_of_tombstoned_class_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteClassRepository::try_new(&conn).unwrap();

    let class = Class::new(Uuid::new_v4(), "Math 7B");
    repo.create(&class).unwrap();
    repo.soft_delete_cascade(class.id).unwrap();

    let err = repo.rename(class.id, "Math 8A").unwrap_err();
    assert!(matches!(err, RepoError::ClassNotFound(id) if id == class.id));
}
