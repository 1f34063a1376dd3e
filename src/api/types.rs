use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::domain::{Permission, Role};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// `?user_id=` on actor-authorized operations.
#[derive(Debug, Deserialize)]
pub struct ActorQuery {
    pub user_id: i32,
}

#[derive(Debug, Serialize)]
pub struct MessageDto {
    pub message: String,
}

impl MessageDto {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeviceIdentityRequest {
    pub mac: String,
    pub hostname: String,
}

#[derive(Debug, Deserialize)]
pub struct ActivateWithKeyRequest {
    pub mac: String,
    pub hostname: String,
    pub key_code: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateDeviceRequest {
    pub mac: String,
    pub hostname: String,
    #[serde(default)]
    pub key_code: Option<String>,
    #[serde(default)]
    pub added_by: Option<i32>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDeviceRequest {
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub active: Option<bool>,
    #[serde(default)]
    pub activated_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    #[serde(default = "default_true", deserialize_with = "deserialize_required_flag")]
    pub active: bool,
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct DeviceStateDto {
    pub device_id: i32,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLogRequest {
    pub mac: String,
    pub hostname: String,
    pub action: String,
    #[serde(default)]
    pub performed_by: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct DeletedCountDto {
    pub deleted: u64,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct PermissionRequest {
    pub user_id: i32,
    pub permission: Permission,
}

#[derive(Debug, Deserialize)]
pub struct GrantPermissionRequest {
    pub user_id: i32,
    pub permission: Permission,
    #[serde(default)]
    pub granted_by: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct PermissionCheckDto {
    pub user_id: i32,
    pub permission: Permission,
    pub has_permission: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn into_bool<E: de::Error>(self) -> Result<bool, E> {
        match self {
            Self::Bool(b) => Ok(b),
            Self::Int(0) => Ok(false),
            Self::Int(1) => Ok(true),
            Self::Int(other) => Err(E::custom(format!(
                "expected a boolean or 0/1, got {other}"
            ))),
        }
    }
}

/// Accepts `true`/`false` as well as the `0`/`1` older clients send.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Flag>::deserialize(deserializer)?
        .map(Flag::into_bool)
        .transpose()
}

fn deserialize_required_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Flag::deserialize(deserializer)?.into_bool()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_accepts_numeric_and_boolean_flags() {
        let numeric: UpdateDeviceRequest = serde_json::from_str(r#"{"active": 1}"#).unwrap();
        assert_eq!(numeric.active, Some(true));

        let boolean: UpdateDeviceRequest = serde_json::from_str(r#"{"active": false}"#).unwrap();
        assert_eq!(boolean.active, Some(false));

        let absent: UpdateDeviceRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.active, None);
    }

    #[test]
    fn update_rejects_other_integers() {
        assert!(serde_json::from_str::<UpdateDeviceRequest>(r#"{"active": 2}"#).is_err());
    }

    #[test]
    fn set_active_defaults_to_true() {
        let req: SetActiveRequest = serde_json::from_str("{}").unwrap();
        assert!(req.active);
    }

    #[test]
    fn create_user_defaults_to_staff() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"username": "alice", "password_hash": "x"}"#).unwrap();
        assert_eq!(req.role, Role::Staff);
    }
}
