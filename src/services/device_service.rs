//! Domain service for the device activation lifecycle.
//!
//! A device moves between registered-inactive and active. Expiry is derived
//! from `expires_at` at read time and never written back.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::db::Device;
use crate::services::PermissionError;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Device {0} not found")]
    NotFound(i32),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Key is invalid or has already been used")]
    KeyInvalid,

    #[error("Device {mac}/{hostname} is already registered")]
    AlreadyRegistered { mac: String, hostname: String },

    #[error("No fields provided to update")]
    NoFieldsProvided,

    #[error("Invalid timestamp for {field}: {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for DeviceError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for DeviceError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<PermissionError> for DeviceError {
    fn from(err: PermissionError) -> Self {
        match err {
            PermissionError::Database(msg) => Self::Database(msg),
            other => Self::PermissionDenied(other.to_string()),
        }
    }
}

/// Answer to a client check-in.
#[derive(Debug, Clone, Serialize)]
pub struct CheckIn {
    pub device_id: i32,
    /// True only while the stored flag is set and the key has not expired.
    pub active: bool,
    pub key_code: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub expired: bool,
    /// Whether this call created the device row.
    pub registered: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedKey {
    pub device_id: i32,
    pub key: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Activation {
    pub device_id: i32,
    pub active: bool,
    pub activated_at: Option<DateTime<Utc>>,
}

/// Administrative insert.
#[derive(Debug, Clone, Default)]
pub struct CreateDevice {
    pub mac: String,
    pub hostname: String,
    pub key_code: Option<String>,
    pub added_by: Option<i32>,
    pub expires_at: Option<String>,
}

/// Partial update with timestamps still in their wire form.
#[derive(Debug, Clone, Default)]
pub struct DeviceUpdate {
    pub active: Option<bool>,
    pub activated_at: Option<String>,
    pub expires_at: Option<String>,
}

#[async_trait::async_trait]
pub trait DeviceService: Send + Sync {
    /// Returns the device for (mac, hostname), registering it on first contact.
    /// Never modifies an existing device.
    async fn check_or_register(&self, mac: &str, hostname: &str) -> Result<CheckIn, DeviceError>;

    /// Generates a fresh key for the device, replacing any previous one.
    ///
    /// # Errors
    ///
    /// [`DeviceError::PermissionDenied`] unless the actor holds `manage_keys`.
    async fn issue_key(
        &self,
        device_id: i32,
        acting_user_id: i32,
    ) -> Result<IssuedKey, DeviceError>;

    /// Activates the device resolved from (mac, hostname) if `key_code` is its
    /// own unused, unexpired key. Unseen devices are registered first.
    async fn activate_with_key(
        &self,
        mac: &str,
        hostname: &str,
        key_code: &str,
    ) -> Result<Activation, DeviceError>;

    /// Clears key and activation. Requires `manage_devices`.
    async fn reset(&self, device_id: i32, acting_user_id: i32) -> Result<Device, DeviceError>;

    async fn update_fields(
        &self,
        device_id: i32,
        update: DeviceUpdate,
    ) -> Result<Device, DeviceError>;

    /// Sets the active flag by id. Activation stamps the current time.
    async fn set_active(&self, device_id: i32, active: bool) -> Result<Device, DeviceError>;

    async fn create(&self, device: CreateDevice) -> Result<Device, DeviceError>;

    async fn get(&self, device_id: i32) -> Result<Device, DeviceError>;

    /// Newest first.
    async fn list(&self) -> Result<Vec<Device>, DeviceError>;

    async fn delete(&self, device_id: i32) -> Result<(), DeviceError>;
}
