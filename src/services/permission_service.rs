//! Domain service deciding whether a user may perform a privileged action.
//!
//! Admins hold every permission, `view_dashboard` is universal, everything
//! else needs a stored grant. Store failures are errors, never `Allowed`.

use serde::Serialize;
use thiserror::Error;

use crate::db::User;
use crate::domain::{AccessDecision, Permission};

/// Errors specific to permission operations.
#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("User {0} not found")]
    UserNotFound(i32),

    #[error("User {user_id} lacks the {permission} permission")]
    PermissionDenied { user_id: i32, permission: Permission },

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for PermissionError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for PermissionError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// A user together with every permission they currently hold.
#[derive(Debug, Clone, Serialize)]
pub struct EffectivePermissions {
    pub user: User,
    pub permissions: Vec<Permission>,
}

#[async_trait::async_trait]
pub trait PermissionService: Send + Sync {
    /// Resolves access for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError::Database`] when the store cannot be read.
    /// Callers must treat that as a denial.
    async fn authorize(
        &self,
        user_id: i32,
        permission: Permission,
    ) -> Result<AccessDecision, PermissionError>;

    /// Like [`Self::authorize`] but anything other than `Allowed` is an error.
    async fn require(&self, user_id: i32, permission: Permission) -> Result<(), PermissionError>;

    /// Grants a permission. Granting twice leaves exactly one grant.
    async fn grant(
        &self,
        user_id: i32,
        permission: Permission,
        granted_by: Option<i32>,
    ) -> Result<(), PermissionError>;

    /// Removes a grant. Revoking an absent grant succeeds.
    async fn revoke(&self, user_id: i32, permission: Permission) -> Result<(), PermissionError>;

    /// Admins get [`Permission::ALL`]; others get stored grants plus `view_dashboard`.
    async fn list_effective(&self, user_id: i32) -> Result<EffectivePermissions, PermissionError>;
}
