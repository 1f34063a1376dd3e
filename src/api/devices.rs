//! Device endpoints: client check-in and activation, plus administration.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::{
    ActivateWithKeyRequest, ActorQuery, ApiError, ApiResponse, AppState, CreateDeviceRequest,
    DeviceIdentityRequest, DeviceStateDto, MessageDto, SetActiveRequest, UpdateDeviceRequest,
};
use crate::db::Device;
use crate::domain::PRIMARY_ADMIN_ID;
use crate::services::{CheckIn, CreateDevice, DeviceError, DeviceUpdate, IssuedKey};

impl From<DeviceError> for ApiError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::NotFound(id) => Self::not_found("Device", id),
            DeviceError::PermissionDenied(msg) => Self::forbidden(msg),
            DeviceError::AlreadyRegistered { .. } => Self::Conflict(err.to_string()),
            DeviceError::KeyInvalid
            | DeviceError::NoFieldsProvided
            | DeviceError::InvalidTimestamp { .. }
            | DeviceError::Validation(_) => Self::validation(err.to_string()),
            DeviceError::Database(msg) => Self::database(msg),
        }
    }
}

/// `POST /api/devices/check`
///
/// Called by client software on every start. Registers unseen devices.
pub async fn check_device(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DeviceIdentityRequest>,
) -> Result<Json<ApiResponse<CheckIn>>, ApiError> {
    let check_in = state
        .device_service()
        .check_or_register(&payload.mac, &payload.hostname)
        .await?;

    Ok(Json(ApiResponse::success(check_in)))
}

pub async fn list_devices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Device>>>, ApiError> {
    let devices = state.device_service().list().await?;
    Ok(Json(ApiResponse::success(devices)))
}

pub async fn get_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Device>>, ApiError> {
    let device = state.device_service().get(id).await?;
    Ok(Json(ApiResponse::success(device)))
}

pub async fn create_device(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDeviceRequest>,
) -> Result<Json<ApiResponse<Device>>, ApiError> {
    let device = state
        .device_service()
        .create(CreateDevice {
            mac: payload.mac,
            hostname: payload.hostname,
            key_code: payload.key_code,
            added_by: Some(payload.added_by.unwrap_or(PRIMARY_ADMIN_ID)),
            expires_at: payload.expires_at,
        })
        .await?;

    Ok(Json(ApiResponse::success(device)))
}

/// `PUT /api/devices/{id}/update`
pub async fn update_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateDeviceRequest>,
) -> Result<Json<ApiResponse<Device>>, ApiError> {
    let device = state
        .device_service()
        .update_fields(
            id,
            DeviceUpdate {
                active: payload.active,
                activated_at: payload.activated_at,
                expires_at: payload.expires_at,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(device)))
}

/// `PUT /api/devices/{id}/activate`
pub async fn set_device_active(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<Json<ApiResponse<DeviceStateDto>>, ApiError> {
    let device = state
        .device_service()
        .set_active(id, payload.active)
        .await?;

    Ok(Json(ApiResponse::success(DeviceStateDto {
        device_id: device.id,
        active: device.active,
        activated_at: device.activated_at,
    })))
}

/// `POST /api/devices/activate`
///
/// Client activation. The key must belong to the device named by mac/hostname.
pub async fn activate_with_key(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ActivateWithKeyRequest>,
) -> Result<Json<ApiResponse<DeviceStateDto>>, ApiError> {
    let activation = state
        .device_service()
        .activate_with_key(&payload.mac, &payload.hostname, &payload.key_code)
        .await?;

    Ok(Json(ApiResponse::success(DeviceStateDto {
        device_id: activation.device_id,
        active: activation.active,
        activated_at: activation.activated_at,
    })))
}

/// `POST /api/devices/{id}/generate-key?user_id=`
pub async fn generate_key(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(actor): Query<ActorQuery>,
) -> Result<Json<ApiResponse<IssuedKey>>, ApiError> {
    let issued = state
        .device_service()
        .issue_key(id, actor.user_id)
        .await?;

    Ok(Json(ApiResponse::success(issued)))
}

/// `POST /api/devices/{id}/reset?user_id=`
pub async fn reset_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(actor): Query<ActorQuery>,
) -> Result<Json<ApiResponse<Device>>, ApiError> {
    let device = state.device_service().reset(id, actor.user_id).await?;
    Ok(Json(ApiResponse::success(device)))
}

pub async fn delete_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageDto>>, ApiError> {
    state.device_service().delete(id).await?;
    Ok(Json(ApiResponse::success(MessageDto::new(
        "Device deleted successfully",
    ))))
}
