//! Roster use-case service: classes and students.
//!
//! # Responsibility
//! - Provide the class/student mutation API keyed by class name and roll
//!   number, the way callers address rosters.
//! - Enforce identity and uniqueness invariants before delegating writes to
//!   the repositories.
//!
//! # Invariants
//! - Rename never changes an identifier; it resolves the existing row and
//!   updates it in place.
//! - Soft-deleted names and roll numbers do not block reuse.
//! - Deleting a class cascades a tombstone to its active students in one
//!   atomic batch and leaves attendance history untouched.

use crate::model::class::{Class, ClassId, OwnerId};
use crate::model::student::{Student, StudentId};
use crate::repo::class_repo::ClassRepository;
use crate::repo::student_repo::StudentRepository;
use crate::service::{DomainError, DomainResult};
use crate::session::SessionProvider;
use log::info;
use std::collections::HashSet;
use std::sync::Arc;

/// Request model for one roster line in `set_students`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    /// Roll number, unique within the class's active roster.
    pub roll_number: String,
    /// Student display name.
    pub name: String,
}

/// Use-case service for class and student mutations.
pub struct RosterService<C: ClassRepository, S: StudentRepository> {
    classes: C,
    students: S,
    session: Arc<dyn SessionProvider>,
}

impl<C: ClassRepository, S: StudentRepository> RosterService<C, S> {
    /// Creates a service over the provided repositories and identity seam.
    pub fn new(classes: C, students: S, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            classes,
            students,
            session,
        }
    }

    fn owner(&self) -> DomainResult<OwnerId> {
        self.session
            .current_user_id()
            .ok_or(DomainError::NotAuthenticated)
    }

    /// Creates a class for the current owner.
    ///
    /// # Errors
    /// - `NotAuthenticated` without an active session.
    /// - `DuplicateName` when an active class with this name exists.
    pub fn create_class(&self, name: &str) -> DomainResult<ClassId> {
        let owner = self.owner()?;
        if self.classes.find_active_by_name(owner, name)?.is_some() {
            return Err(DomainError::DuplicateName(name.to_string()));
        }

        let class = Class::new(owner, name);
        let id = self.classes.create(&class)?;
        info!("event=class_create module=service status=ok class_id={id}");
        Ok(id)
    }

    /// Renames a class in place; the identifier is guaranteed stable.
    ///
    /// Renaming a class to its current name is a no-op.
    ///
    /// # Errors
    /// - `ClassNotFound` when `old_name` has no active row.
    /// - `DuplicateName` when `new_name` collides with another active class.
    pub fn rename_class(&self, old_name: &str, new_name: &str) -> DomainResult<()> {
        if old_name == new_name {
            return Ok(());
        }

        let owner = self.owner()?;
        let class = self
            .classes
            .find_active_by_name(owner, old_name)?
            .ok_or_else(|| DomainError::ClassNotFound(old_name.to_string()))?;

        if let Some(other) = self.classes.find_active_by_name(owner, new_name)? {
            if other.id != class.id {
                return Err(DomainError::DuplicateName(new_name.to_string()));
            }
        }

        self.classes.rename(class.id, new_name)?;
        info!(
            "event=class_rename module=service status=ok class_id={}",
            class.id
        );
        Ok(())
    }

    /// Soft-deletes a class and cascades to its active students atomically.
    /// Returns the number of students tombstoned.
    pub fn delete_class(&self, name: &str) -> DomainResult<u64> {
        let owner = self.owner()?;
        let class = self
            .classes
            .find_active_by_name(owner, name)?
            .ok_or_else(|| DomainError::ClassNotFound(name.to_string()))?;

        let students = self.classes.soft_delete_cascade(class.id)?;
        info!(
            "event=class_delete module=service status=ok class_id={} students_tombstoned={students}",
            class.id
        );
        Ok(students)
    }

    /// Returns active class names for the current owner in creation order.
    pub fn get_classes(&self) -> DomainResult<Vec<String>> {
        let owner = self.owner()?;
        let classes = self.classes.list_for_owner(owner, false)?;
        Ok(classes.into_iter().map(|class| class.name).collect())
    }

    /// Resolves an active class by name for the current owner.
    pub fn find_class(&self, name: &str) -> DomainResult<Option<Class>> {
        let owner = self.owner()?;
        Ok(self.classes.find_active_by_name(owner, name)?)
    }

    /// Adds one student to a class.
    ///
    /// # Errors
    /// - `ClassNotFound` when the class id has no active row.
    /// - `DuplicateRollNumber` when an active student with this roll number
    ///   already exists in the class.
    pub fn add_student(
        &self,
        class_id: ClassId,
        roll_number: &str,
        name: &str,
    ) -> DomainResult<StudentId> {
        self.require_active_class(class_id)?;
        if self
            .students
            .find_active_by_roll(class_id, roll_number)?
            .is_some()
        {
            return Err(DomainError::DuplicateRollNumber(roll_number.to_string()));
        }

        let student = Student::new(class_id, roll_number, name);
        let id = self.students.create(&student)?;
        info!("event=student_add module=service status=ok class_id={class_id} student_id={id}");
        Ok(id)
    }

    /// Bulk-replaces the active roster of a class as one atomic operation:
    /// tombstones every active student, then inserts the new roster.
    ///
    /// # Errors
    /// - `DuplicateRollNumber` when the new roster repeats a roll number.
    pub fn set_students(
        &self,
        class_id: ClassId,
        roster: &[RosterEntry],
    ) -> DomainResult<Vec<StudentId>> {
        self.require_active_class(class_id)?;

        let mut seen = HashSet::new();
        for entry in roster {
            if !seen.insert(entry.roll_number.as_str()) {
                return Err(DomainError::DuplicateRollNumber(entry.roll_number.clone()));
            }
        }

        let students: Vec<Student> = roster
            .iter()
            .map(|entry| Student::new(class_id, entry.roll_number.clone(), entry.name.clone()))
            .collect();
        self.students.replace_roster(class_id, &students)?;

        info!(
            "event=roster_replace module=service status=ok class_id={class_id} size={}",
            students.len()
        );
        Ok(students.into_iter().map(|student| student.id).collect())
    }

    /// Returns the active roster of a class in creation order.
    ///
    /// An unknown class id yields an empty roster, not an error.
    pub fn get_students(&self, class_id: ClassId) -> DomainResult<Vec<Student>> {
        Ok(self.students.list_for_class(class_id, false)?)
    }

    /// Renames one active student, resolved by roll number. Identifier
    /// stability mirrors class rename.
    pub fn update_student_name(
        &self,
        class_id: ClassId,
        roll_number: &str,
        new_name: &str,
    ) -> DomainResult<()> {
        let student = self
            .students
            .find_active_by_roll(class_id, roll_number)?
            .ok_or_else(|| DomainError::StudentNotFound(roll_number.to_string()))?;

        self.students.rename(student.id, new_name)?;
        Ok(())
    }

    /// Soft-deletes one active student, resolved by roll number. Attendance
    /// history for the student is retained.
    pub fn delete_student(&self, class_id: ClassId, roll_number: &str) -> DomainResult<()> {
        let student = self
            .students
            .find_active_by_roll(class_id, roll_number)?
            .ok_or_else(|| DomainError::StudentNotFound(roll_number.to_string()))?;

        self.students.soft_delete(student.id)?;
        info!(
            "event=student_delete module=service status=ok class_id={class_id} student_id={}",
            student.id
        );
        Ok(())
    }

    fn require_active_class(&self, class_id: ClassId) -> DomainResult<()> {
        match self.classes.get(class_id, false)? {
            Some(_) => Ok(()),
            None => Err(DomainError::ClassNotFound(class_id.to_string())),
        }
    }
}
