use crate::entities::{logs, prelude::*};
use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

pub use crate::entities::logs::Model as LogEntry;

pub struct LogRepository {
    conn: DatabaseConnection,
}

impl LogRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(
        &self,
        mac: &str,
        hostname: &str,
        action: &str,
        performed_by: Option<i32>,
    ) -> Result<LogEntry> {
        let active_model = logs::ActiveModel {
            mac: Set(mac.to_string()),
            hostname: Set(hostname.to_string()),
            action: Set(action.to_string()),
            performed_by: Set(performed_by),
            timestamp: Set(chrono::Utc::now()),
            ..Default::default()
        };

        active_model
            .insert(&self.conn)
            .await
            .context("Failed to append log entry")
    }

    /// All entries, newest first.
    pub async fn list_all(&self) -> Result<Vec<LogEntry>> {
        Logs::find()
            .order_by_desc(logs::Column::Timestamp)
            .order_by_desc(logs::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list log entries")
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Logs::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete log entry")?;
        Ok(result.rows_affected > 0)
    }

    pub async fn clear_logs(&self) -> Result<u64> {
        let result = Logs::delete_many()
            .exec(&self.conn)
            .await
            .context("Failed to clear log entries")?;
        Ok(result.rows_affected)
    }
}
