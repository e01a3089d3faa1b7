//! Core use-case services (the mutation API).
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level operations keyed the
//!   way callers think: class names, roll numbers, calendar dates.
//! - Enforce session identity and uniqueness invariants before any write.
//!
//! # Invariants
//! - Services never bypass repository persistence contracts.
//! - Uniqueness violations surface as the named conflict error, never as a
//!   storage error.
//! - Mutation errors are surfaced synchronously to the caller.

pub mod attendance_service;
pub mod roster_service;

use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type DomainResult<T> = Result<T, DomainError>;

/// Errors surfaced by the mutation API.
#[derive(Debug)]
pub enum DomainError {
    /// No account identity is available for an identity-dependent write.
    NotAuthenticated,
    /// An active class with this name already exists for the owner.
    DuplicateName(String),
    /// An active student with this roll number already exists in the class.
    DuplicateRollNumber(String),
    /// The named class does not resolve to an active row.
    ClassNotFound(String),
    /// The named student does not resolve to an active row in the class.
    StudentNotFound(String),
    /// Underlying repository failure.
    Repo(RepoError),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "no authenticated user for this operation"),
            Self::DuplicateName(name) => {
                write!(f, "a class named `{name}` already exists")
            }
            Self::DuplicateRollNumber(roll) => {
                write!(f, "a student with roll number `{roll}` already exists")
            }
            Self::ClassNotFound(key) => write!(f, "no active class for `{key}`"),
            Self::StudentNotFound(key) => write!(f, "no active student for `{key}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DomainError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for DomainError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}
