//! `SeaORM` implementation of the `AuditService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::{LogEntry, Store};
use crate::domain::{AuditAction, Permission};
use crate::services::PermissionService;
use crate::services::audit_service::{AuditError, AuditService};

pub struct SeaOrmAuditService {
    store: Store,
    permissions: Arc<dyn PermissionService>,
}

impl SeaOrmAuditService {
    #[must_use]
    pub fn new(store: Store, permissions: Arc<dyn PermissionService>) -> Self {
        Self { store, permissions }
    }
}

#[async_trait]
impl AuditService for SeaOrmAuditService {
    async fn append(
        &self,
        mac: &str,
        hostname: &str,
        action: &str,
        performed_by: Option<i32>,
    ) -> Result<LogEntry, AuditError> {
        let entry = self
            .store
            .add_log(mac, hostname, action, performed_by)
            .await?;
        metrics::counter!("keycolony_audit_entries_total", "action" => action.to_string())
            .increment(1);
        Ok(entry)
    }

    async fn record_best_effort(
        &self,
        mac: &str,
        hostname: &str,
        action: AuditAction,
        performed_by: Option<i32>,
    ) {
        if let Err(e) = self
            .append(mac, hostname, action.as_str(), performed_by)
            .await
        {
            warn!(%action, mac, hostname, error = %e, "Failed to record audit entry");
        }
    }

    async fn list_all(&self) -> Result<Vec<LogEntry>, AuditError> {
        Ok(self.store.list_logs().await?)
    }

    async fn delete_one(&self, id: i32, acting_user_id: i32) -> Result<(), AuditError> {
        self.permissions
            .require(acting_user_id, Permission::ManageLogs)
            .await?;

        if !self.store.delete_log(id).await? {
            return Err(AuditError::NotFound(id));
        }

        info!(log_id = id, acting_user_id, "Deleted log entry");
        Ok(())
    }

    async fn delete_all(&self, acting_user_id: i32) -> Result<u64, AuditError> {
        self.permissions
            .require(acting_user_id, Permission::ManageLogs)
            .await?;

        let removed = self.store.clear_logs().await?;
        info!(removed, acting_user_id, "Cleared audit log");
        Ok(removed)
    }
}
