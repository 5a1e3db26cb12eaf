//! Caller identity and the admin capability.
//!
//! Core operations never look up "the current user" from ambient state. The
//! session layer resolves a token into an [`Identity`] and hands it to every
//! operation. Admin-only operations additionally take an [`Admin`], which can
//! only be obtained through [`Identity::require_admin`].

use serde::Serialize;
use thiserror::Error;

use super::models::{AccessTokenClaims, UserId};

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Identity {
    user_id: UserId,
    is_admin: bool,
}

impl Identity {
    pub fn new(user_id: UserId, is_admin: bool) -> Self {
        Self { user_id, is_admin }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// The single authorization predicate for admin-only operations.
    pub fn require_admin(&self) -> Result<Admin, AdminOnly> {
        if self.is_admin {
            Ok(Admin {
                user_id: self.user_id,
            })
        } else {
            Err(AdminOnly)
        }
    }
}

impl From<&AccessTokenClaims> for Identity {
    fn from(claims: &AccessTokenClaims) -> Self {
        Self::new(claims.sub, claims.is_admin)
    }
}

/// Proof that the caller passed the admin check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admin {
    user_id: UserId,
}

impl Admin {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

/// Rejection returned when a non-admin calls an admin-only operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Admin only.")]
pub struct AdminOnly;
