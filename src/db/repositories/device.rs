use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, UpdateMany, sea_query::Expr,
};
use tracing::{debug, info};

use crate::entities::{devices, prelude::*};

pub use crate::entities::devices::Model as Device;

/// Fields accepted by an administrative device insert.
#[derive(Debug, Clone, Default)]
pub struct NewDevice {
    pub mac: String,
    pub hostname: String,
    pub key_code: Option<String>,
    pub added_by: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update of a device's activation columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DevicePatch {
    pub active: Option<bool>,
    pub activated_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl DevicePatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.active.is_none() && self.activated_at.is_none() && self.expires_at.is_none()
    }
}

/// Result of a check-in lookup.
#[derive(Debug, Clone)]
pub struct Registration {
    pub device: Device,
    pub created: bool,
}

/// Result of presenting a key for the device resolved from (mac, hostname).
#[derive(Debug, Clone)]
pub enum KeyActivation {
    Activated(Device),
    /// The key does not belong to this device, was already used, or has expired.
    Rejected(Device),
}

pub struct DeviceRepository {
    conn: DatabaseConnection,
}

impl DeviceRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<Device>> {
        Devices::find()
            .order_by_desc(devices::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list devices")
    }

    pub async fn get(&self, id: i32) -> Result<Option<Device>> {
        Devices::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query device by ID")
    }

    /// Finds the device for (mac, hostname), inserting an inactive keyless row
    /// if none exists. Never modifies an existing row.
    pub async fn register_or_get(&self, mac: &str, hostname: &str) -> Result<Registration> {
        let txn = self.conn.begin().await?;
        let registration = register_or_get(&txn, mac, hostname).await?;
        txn.commit().await?;

        if registration.created {
            info!(
                device_id = registration.device.id,
                mac, hostname, "Registered new device"
            );
        }
        Ok(registration)
    }

    /// Inserts a device. Returns `None` when (mac, hostname) is already registered.
    pub async fn create(&self, device: NewDevice) -> Result<Option<Device>> {
        let txn = self.conn.begin().await?;

        let model = devices::ActiveModel {
            mac: Set(device.mac.clone()),
            hostname: Set(device.hostname.clone()),
            key_code: Set(device.key_code),
            active: Set(false),
            activated_at: Set(None),
            expires_at: Set(device.expires_at),
            added_by: Set(device.added_by),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let inserted = Devices::insert(model)
            .on_conflict(identity_conflict())
            .exec_without_returning(&txn)
            .await
            .context("Failed to insert device")?;

        if inserted == 0 {
            return Ok(None);
        }

        let created = find_by_identity(&txn, &device.mac, &device.hostname).await?;
        txn.commit().await?;
        Ok(created)
    }

    /// Replaces the device's key and expiry. Returns `None` if the device is absent.
    pub async fn assign_key(
        &self,
        id: i32,
        key_code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Device>> {
        let txn = self.conn.begin().await?;

        let update = Devices::update_many()
            .col_expr(devices::Column::KeyCode, Expr::value(key_code.to_string()))
            .col_expr(devices::Column::ExpiresAt, Expr::value(expires_at));
        let updated = update_by_id(&txn, id, update)
            .await
            .context("Failed to store device key")?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Registers the device if unseen, then activates it when `key_code` is its
    /// own unused, unexpired key.
    pub async fn activate_with_key(
        &self,
        mac: &str,
        hostname: &str,
        key_code: &str,
        now: DateTime<Utc>,
    ) -> Result<KeyActivation> {
        let txn = self.conn.begin().await?;

        let Registration { device, .. } = register_or_get(&txn, mac, hostname).await?;

        if device.key_code.as_deref() != Some(key_code) || device.active || device.is_expired(now) {
            txn.commit().await?;
            debug!(device_id = device.id, "Rejected activation key");
            return Ok(KeyActivation::Rejected(device));
        }

        // Matches nothing if the row was reset or re-keyed after the read above
        let activated = Devices::update_many()
            .col_expr(devices::Column::Active, Expr::value(true))
            .col_expr(devices::Column::ActivatedAt, Expr::value(now))
            .filter(devices::Column::Id.eq(device.id))
            .filter(devices::Column::KeyCode.eq(key_code))
            .filter(devices::Column::Active.eq(false))
            .exec(&txn)
            .await
            .context("Failed to activate device")?;

        if activated.rows_affected == 0 {
            txn.commit().await?;
            debug!(device_id = device.id, "Activation lost to a concurrent update");
            return Ok(KeyActivation::Rejected(device));
        }

        let updated = Devices::find_by_id(device.id)
            .one(&txn)
            .await
            .context("Failed to query device by ID")?
            .ok_or_else(|| anyhow::anyhow!("Device {} vanished during activation", device.id))?;

        txn.commit().await?;
        Ok(KeyActivation::Activated(updated))
    }

    /// Returns the device to the unactivated, keyless state.
    pub async fn reset(&self, id: i32) -> Result<Option<Device>> {
        let txn = self.conn.begin().await?;

        let update = Devices::update_many()
            .col_expr(devices::Column::KeyCode, Expr::value(Option::<String>::None))
            .col_expr(devices::Column::Active, Expr::value(false))
            .col_expr(
                devices::Column::ActivatedAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            );
        let updated = update_by_id(&txn, id, update)
            .await
            .context("Failed to reset device")?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Applies a patch. Returns `None` if the device is absent.
    pub async fn update_fields(&self, id: i32, patch: DevicePatch) -> Result<Option<Device>> {
        if patch.is_empty() {
            return self.get(id).await;
        }

        let txn = self.conn.begin().await?;

        let mut update = Devices::update_many();
        if let Some(flag) = patch.active {
            update = update.col_expr(devices::Column::Active, Expr::value(flag));
        }
        if let Some(at) = patch.activated_at {
            update = update.col_expr(devices::Column::ActivatedAt, Expr::value(at));
        }
        if let Some(at) = patch.expires_at {
            update = update.col_expr(devices::Column::ExpiresAt, Expr::value(at));
        }
        let updated = update_by_id(&txn, id, update)
            .await
            .context("Failed to update device")?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Sets the active flag directly; activation stamps `now`, deactivation clears it.
    pub async fn set_active(
        &self,
        id: i32,
        active_flag: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<Device>> {
        let txn = self.conn.begin().await?;

        let update = Devices::update_many()
            .col_expr(devices::Column::Active, Expr::value(active_flag))
            .col_expr(
                devices::Column::ActivatedAt,
                Expr::value(active_flag.then_some(now)),
            );
        let updated = update_by_id(&txn, id, update)
            .await
            .context("Failed to set device activation")?;

        txn.commit().await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Devices::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete device")?;

        let removed = result.rows_affected > 0;
        if removed {
            info!(device_id = id, "Deleted device");
        }
        Ok(removed)
    }
}

/// Writes before reading so a transaction never has to upgrade a read lock.
async fn update_by_id<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    update: UpdateMany<Devices>,
) -> Result<Option<Device>> {
    let result = update
        .filter(devices::Column::Id.eq(id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Ok(None);
    }

    Devices::find_by_id(id)
        .one(conn)
        .await
        .context("Failed to query device by ID")
}

fn identity_conflict() -> sea_orm::sea_query::OnConflict {
    sea_orm::sea_query::OnConflict::columns([devices::Column::Mac, devices::Column::Hostname])
        .do_nothing()
        .to_owned()
}

async fn find_by_identity<C: ConnectionTrait>(
    conn: &C,
    mac: &str,
    hostname: &str,
) -> Result<Option<Device>> {
    Devices::find()
        .filter(devices::Column::Mac.eq(mac))
        .filter(devices::Column::Hostname.eq(hostname))
        .one(conn)
        .await
        .context("Failed to query device by mac/hostname")
}

async fn register_or_get<C: ConnectionTrait>(
    conn: &C,
    mac: &str,
    hostname: &str,
) -> Result<Registration> {
    let model = devices::ActiveModel {
        mac: Set(mac.to_string()),
        hostname: Set(hostname.to_string()),
        key_code: Set(None),
        active: Set(false),
        activated_at: Set(None),
        expires_at: Set(None),
        added_by: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let inserted = Devices::insert(model)
        .on_conflict(identity_conflict())
        .exec_without_returning(conn)
        .await
        .context("Failed to auto-register device")?;

    let device = find_by_identity(conn, mac, hostname)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Device {mac}/{hostname} vanished after upsert"))?;

    Ok(Registration {
        device,
        created: inserted > 0,
    })
}
