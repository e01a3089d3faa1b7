//! Session identity seam.
//!
//! The identity/authentication provider is an external collaborator; the
//! core consumes it only through `current_user_id`. Every identity-dependent
//! write checks this seam and fails with `NotAuthenticated` when no account
//! is active.

use crate::model::class::OwnerId;

/// Capability handed in by the host: who is signed in right now, if anyone.
pub trait SessionProvider: Send + Sync {
    /// Returns the active account id, or `None` when signed out.
    fn current_user_id(&self) -> Option<OwnerId>;
}

/// Fixed-identity provider for hosts with a single local account and for
/// tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticSession {
    user_id: Option<OwnerId>,
}

impl StaticSession {
    /// A session signed in as `user_id`.
    pub fn signed_in(user_id: OwnerId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    /// A signed-out session.
    pub fn signed_out() -> Self {
        Self { user_id: None }
    }
}

impl SessionProvider for StaticSession {
    fn current_user_id(&self) -> Option<OwnerId> {
        self.user_id
    }
}
