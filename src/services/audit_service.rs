//! Domain service for the append-only audit log.

use thiserror::Error;

use crate::db::LogEntry;
use crate::domain::AuditAction;
use crate::services::PermissionError;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Log entry {0} not found")]
    NotFound(i32),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for AuditError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuditError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<PermissionError> for AuditError {
    fn from(err: PermissionError) -> Self {
        match err {
            PermissionError::Database(msg) => Self::Database(msg),
            other => Self::PermissionDenied(other.to_string()),
        }
    }
}

#[async_trait::async_trait]
pub trait AuditService: Send + Sync {
    /// Appends an entry stamped with the current time.
    async fn append(
        &self,
        mac: &str,
        hostname: &str,
        action: &str,
        performed_by: Option<i32>,
    ) -> Result<LogEntry, AuditError>;

    /// Appends a core action, logging and discarding any failure.
    async fn record_best_effort(
        &self,
        mac: &str,
        hostname: &str,
        action: AuditAction,
        performed_by: Option<i32>,
    );

    /// All entries, newest first.
    async fn list_all(&self) -> Result<Vec<LogEntry>, AuditError>;

    /// Requires `manage_logs`.
    async fn delete_one(&self, id: i32, acting_user_id: i32) -> Result<(), AuditError>;

    /// Requires `manage_logs`. Returns the number of entries removed.
    async fn delete_all(&self, acting_user_id: i32) -> Result<u64, AuditError>;
}
