//! Domain service for the administrative user directory.

use thiserror::Error;

use crate::db::User;
use crate::domain::Role;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User {0} not found")]
    NotFound(i32),

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Cannot delete the primary admin user")]
    Forbidden,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Users ordered by id. Password hashes are never included.
    async fn list(&self) -> Result<Vec<User>, UserError>;

    /// Creates a user from an already-hashed password.
    ///
    /// Staff accounts also receive `view_dashboard`; failing to store that
    /// grant does not fail the creation.
    ///
    /// # Errors
    ///
    /// [`UserError::UsernameTaken`] when the username exists.
    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, UserError>;

    /// Deletes a user and its grants.
    ///
    /// # Errors
    ///
    /// [`UserError::Forbidden`] for the primary admin, checked before any store access.
    async fn delete(&self, user_id: i32) -> Result<(), UserError>;
}
