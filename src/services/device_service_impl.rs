//! `SeaORM` implementation of the `DeviceService` trait.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::DeviceConfig;
use crate::db::{Device, DevicePatch, KeyActivation, NewDevice, Store};
use crate::domain::{AuditAction, Permission, parse_timestamp};
use crate::services::device_service::{
    Activation, CheckIn, CreateDevice, DeviceError, DeviceService, DeviceUpdate, IssuedKey,
};
use crate::services::{AuditService, PermissionService};

const KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random activation key of `len` characters from `A-Z0-9`.
#[must_use]
pub fn generate_key(len: usize) -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(KEY_ALPHABET[rng.random_range(0..KEY_ALPHABET.len())]))
        .collect()
}

pub struct SeaOrmDeviceService {
    store: Store,
    permissions: Arc<dyn PermissionService>,
    audit: Arc<dyn AuditService>,
    config: DeviceConfig,
}

impl SeaOrmDeviceService {
    #[must_use]
    pub fn new(
        store: Store,
        permissions: Arc<dyn PermissionService>,
        audit: Arc<dyn AuditService>,
        config: DeviceConfig,
    ) -> Self {
        Self {
            store,
            permissions,
            audit,
            config,
        }
    }

    fn key_expiry(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, DeviceError> {
        TimeDelta::try_days(self.config.key_validity_days)
            .and_then(|validity| now.checked_add_signed(validity))
            .ok_or_else(|| {
                DeviceError::Validation(format!(
                    "key validity of {} days is out of range",
                    self.config.key_validity_days
                ))
            })
    }
}

fn require_identity(mac: &str, hostname: &str) -> Result<(), DeviceError> {
    if mac.trim().is_empty() || hostname.trim().is_empty() {
        return Err(DeviceError::Validation(
            "mac and hostname are required".to_string(),
        ));
    }
    Ok(())
}

fn parse_field(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, DeviceError> {
    value
        .map(|raw| {
            parse_timestamp(raw).ok_or_else(|| DeviceError::InvalidTimestamp {
                field,
                value: raw.to_string(),
            })
        })
        .transpose()
}

#[async_trait]
impl DeviceService for SeaOrmDeviceService {
    async fn check_or_register(&self, mac: &str, hostname: &str) -> Result<CheckIn, DeviceError> {
        require_identity(mac, hostname)?;

        let registration = self.store.register_or_get_device(mac, hostname).await?;
        let device = registration.device;
        let now = Utc::now();

        metrics::counter!(
            "keycolony_device_checkins_total",
            "registered" => registration.created.to_string()
        )
        .increment(1);

        Ok(CheckIn {
            device_id: device.id,
            active: device.is_usable(now),
            expired: device.is_expired(now),
            key_code: device.key_code,
            expires_at: device.expires_at,
            registered: registration.created,
        })
    }

    async fn issue_key(
        &self,
        device_id: i32,
        acting_user_id: i32,
    ) -> Result<IssuedKey, DeviceError> {
        self.permissions
            .require(acting_user_id, Permission::ManageKeys)
            .await?;

        let key = generate_key(self.config.key_length);
        let expires_at = self.key_expiry(Utc::now())?;

        let device = self
            .store
            .assign_device_key(device_id, &key, expires_at)
            .await?
            .ok_or(DeviceError::NotFound(device_id))?;

        info!(device_id, acting_user_id, %expires_at, "Issued activation key");
        metrics::counter!("keycolony_keys_issued_total").increment(1);

        self.audit
            .record_best_effort(
                &device.mac,
                &device.hostname,
                AuditAction::GenerateKey,
                Some(acting_user_id),
            )
            .await;

        Ok(IssuedKey {
            device_id,
            key,
            expires_at,
        })
    }

    async fn activate_with_key(
        &self,
        mac: &str,
        hostname: &str,
        key_code: &str,
    ) -> Result<Activation, DeviceError> {
        require_identity(mac, hostname)?;

        let outcome = self
            .store
            .activate_device_with_key(mac, hostname, key_code, Utc::now())
            .await?;

        match outcome {
            KeyActivation::Activated(device) => {
                info!(device_id = device.id, mac, hostname, "Device activated with key");
                metrics::counter!("keycolony_activations_total", "outcome" => "activated")
                    .increment(1);

                self.audit
                    .record_best_effort(mac, hostname, AuditAction::Activate, None)
                    .await;

                Ok(Activation {
                    device_id: device.id,
                    active: device.active,
                    activated_at: device.activated_at,
                })
            }
            KeyActivation::Rejected(device) => {
                debug!(device_id = device.id, mac, hostname, "Activation key rejected");
                metrics::counter!("keycolony_activations_total", "outcome" => "rejected")
                    .increment(1);
                Err(DeviceError::KeyInvalid)
            }
        }
    }

    async fn reset(&self, device_id: i32, acting_user_id: i32) -> Result<Device, DeviceError> {
        self.permissions
            .require(acting_user_id, Permission::ManageDevices)
            .await?;

        let device = self
            .store
            .reset_device(device_id)
            .await?
            .ok_or(DeviceError::NotFound(device_id))?;

        info!(device_id, acting_user_id, "Reset device");

        self.audit
            .record_best_effort(
                &device.mac,
                &device.hostname,
                AuditAction::Reset,
                Some(acting_user_id),
            )
            .await;

        Ok(device)
    }

    async fn update_fields(
        &self,
        device_id: i32,
        update: DeviceUpdate,
    ) -> Result<Device, DeviceError> {
        let mut patch = DevicePatch {
            active: update.active,
            activated_at: parse_field("activated_at", update.activated_at.as_deref())?,
            expires_at: parse_field("expires_at", update.expires_at.as_deref())?,
        };

        if patch.is_empty() {
            return Err(DeviceError::NoFieldsProvided);
        }

        if patch.active == Some(true) && patch.activated_at.is_none() {
            patch.activated_at = Some(Utc::now());
        }

        let device = self
            .store
            .update_device(device_id, patch)
            .await?
            .ok_or(DeviceError::NotFound(device_id))?;

        debug!(device_id, ?patch, "Updated device fields");
        Ok(device)
    }

    async fn set_active(&self, device_id: i32, active: bool) -> Result<Device, DeviceError> {
        let device = self
            .store
            .set_device_active(device_id, active, Utc::now())
            .await?
            .ok_or(DeviceError::NotFound(device_id))?;

        info!(device_id, active, "Set device activation");
        Ok(device)
    }

    async fn create(&self, device: CreateDevice) -> Result<Device, DeviceError> {
        require_identity(&device.mac, &device.hostname)?;

        let expires_at = parse_field("expires_at", device.expires_at.as_deref())?;
        let new_device = NewDevice {
            mac: device.mac.clone(),
            hostname: device.hostname.clone(),
            key_code: device.key_code.filter(|k| !k.is_empty()),
            added_by: device.added_by,
            expires_at,
        };

        let created = self
            .store
            .create_device(new_device)
            .await?
            .ok_or(DeviceError::AlreadyRegistered {
                mac: device.mac,
                hostname: device.hostname,
            })?;

        info!(device_id = created.id, added_by = created.added_by, "Created device");
        Ok(created)
    }

    async fn get(&self, device_id: i32) -> Result<Device, DeviceError> {
        self.store
            .get_device(device_id)
            .await?
            .ok_or(DeviceError::NotFound(device_id))
    }

    async fn list(&self) -> Result<Vec<Device>, DeviceError> {
        Ok(self.store.list_devices().await?)
    }

    async fn delete(&self, device_id: i32) -> Result<(), DeviceError> {
        if self.store.delete_device(device_id).await? {
            Ok(())
        } else {
            Err(DeviceError::NotFound(device_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_use_uppercase_alphanumerics() {
        let key = generate_key(16);
        assert_eq!(key.len(), 16);
        assert!(
            key.chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn generated_keys_differ() {
        assert_ne!(generate_key(16), generate_key(16));
    }

    #[test]
    fn parse_field_reports_the_offending_field() {
        let err = parse_field("expires_at", Some("next tuesday")).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::InvalidTimestamp { field: "expires_at", .. }
        ));
        assert_eq!(parse_field("expires_at", None).unwrap(), None);
    }
}
