use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::{Permission, Role};

pub mod migrator;
pub mod repositories;

pub use repositories::device::{Device, DevicePatch, KeyActivation, NewDevice, Registration};
pub use repositories::logs::LogEntry;
pub use repositories::user::User;

/// Gateway to the relational store. Owns all persisted state; callers only
/// ever hold request-scoped copies of rows.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        // Every pooled connection to `:memory:` would open its own database
        let in_memory = db_url.contains(":memory:");
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn permission_repo(&self) -> repositories::permission::PermissionRepository {
        repositories::permission::PermissionRepository::new(self.conn.clone())
    }

    fn device_repo(&self) -> repositories::device::DeviceRepository {
        repositories::device::DeviceRepository::new(self.conn.clone())
    }

    fn logs_repo(&self) -> repositories::logs::LogRepository {
        repositories::logs::LogRepository::new(self.conn.clone())
    }

    // Users

    pub async fn ensure_primary_admin(&self, config: &SecurityConfig) -> Result<bool> {
        self.user_repo().ensure_primary_admin(config).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list().await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Option<User>> {
        self.user_repo().insert(username, password_hash, role).await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    // Permission grants

    pub async fn has_permission_grant(&self, user_id: i32, permission: Permission) -> Result<bool> {
        self.permission_repo().has_grant(user_id, permission).await
    }

    pub async fn list_permission_grants(&self, user_id: i32) -> Result<Vec<Permission>> {
        self.permission_repo().list_for_user(user_id).await
    }

    pub async fn count_permission_grants(&self, user_id: i32) -> Result<u64> {
        self.permission_repo().count_for_user(user_id).await
    }

    pub async fn grant_permission(
        &self,
        user_id: i32,
        permission: Permission,
        granted_by: Option<i32>,
    ) -> Result<bool> {
        self.permission_repo()
            .grant(user_id, permission, granted_by)
            .await
    }

    pub async fn revoke_permission(&self, user_id: i32, permission: Permission) -> Result<bool> {
        self.permission_repo().revoke(user_id, permission).await
    }

    // Devices

    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        self.device_repo().list().await
    }

    pub async fn get_device(&self, id: i32) -> Result<Option<Device>> {
        self.device_repo().get(id).await
    }

    pub async fn register_or_get_device(&self, mac: &str, hostname: &str) -> Result<Registration> {
        self.device_repo().register_or_get(mac, hostname).await
    }

    pub async fn create_device(&self, device: NewDevice) -> Result<Option<Device>> {
        self.device_repo().create(device).await
    }

    pub async fn assign_device_key(
        &self,
        id: i32,
        key_code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Device>> {
        self.device_repo()
            .assign_key(id, key_code, expires_at)
            .await
    }

    pub async fn activate_device_with_key(
        &self,
        mac: &str,
        hostname: &str,
        key_code: &str,
        now: DateTime<Utc>,
    ) -> Result<KeyActivation> {
        self.device_repo()
            .activate_with_key(mac, hostname, key_code, now)
            .await
    }

    pub async fn reset_device(&self, id: i32) -> Result<Option<Device>> {
        self.device_repo().reset(id).await
    }

    pub async fn update_device(&self, id: i32, patch: DevicePatch) -> Result<Option<Device>> {
        self.device_repo().update_fields(id, patch).await
    }

    pub async fn set_device_active(
        &self,
        id: i32,
        active: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<Device>> {
        self.device_repo().set_active(id, active, now).await
    }

    pub async fn delete_device(&self, id: i32) -> Result<bool> {
        self.device_repo().delete(id).await
    }

    // Audit log

    pub async fn add_log(
        &self,
        mac: &str,
        hostname: &str,
        action: &str,
        performed_by: Option<i32>,
    ) -> Result<LogEntry> {
        self.logs_repo()
            .add(mac, hostname, action, performed_by)
            .await
    }

    pub async fn list_logs(&self) -> Result<Vec<LogEntry>> {
        self.logs_repo().list_all().await
    }

    pub async fn delete_log(&self, id: i32) -> Result<bool> {
        self.logs_repo().delete(id).await
    }

    pub async fn clear_logs(&self) -> Result<u64> {
        self.logs_repo().clear_logs().await
    }
}
