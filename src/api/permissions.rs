use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, AppState, GrantPermissionRequest, MessageDto, PermissionCheckDto,
    PermissionRequest,
};
use crate::domain::{AccessDecision, PRIMARY_ADMIN_ID};
use crate::services::{EffectivePermissions, PermissionError};

impl From<PermissionError> for ApiError {
    fn from(err: PermissionError) -> Self {
        match err {
            PermissionError::UserNotFound(id) => Self::not_found("User", id),
            PermissionError::PermissionDenied { .. } => Self::forbidden(err.to_string()),
            PermissionError::Database(msg) => Self::database(msg),
        }
    }
}

/// `GET /api/permissions/{user_id}`
pub async fn get_user_permissions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Json<ApiResponse<EffectivePermissions>>, ApiError> {
    let effective = state.permission_service().list_effective(user_id).await?;
    Ok(Json(ApiResponse::success(effective)))
}

/// `POST /api/permissions/check`
///
/// Unknown users are reported as 404; store failures are errors, never `true`.
pub async fn check_permission(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PermissionRequest>,
) -> Result<Json<ApiResponse<PermissionCheckDto>>, ApiError> {
    let decision = state
        .permission_service()
        .authorize(payload.user_id, payload.permission)
        .await?;

    if decision == AccessDecision::UserNotFound {
        return Err(ApiError::not_found("User", payload.user_id));
    }

    Ok(Json(ApiResponse::success(PermissionCheckDto {
        user_id: payload.user_id,
        permission: payload.permission,
        has_permission: decision.is_allowed(),
    })))
}

pub async fn grant_permission(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GrantPermissionRequest>,
) -> Result<Json<ApiResponse<MessageDto>>, ApiError> {
    state
        .permission_service()
        .grant(
            payload.user_id,
            payload.permission,
            Some(payload.granted_by.unwrap_or(PRIMARY_ADMIN_ID)),
        )
        .await?;

    Ok(Json(ApiResponse::success(MessageDto::new(format!(
        "Granted {} to user {}",
        payload.permission, payload.user_id
    )))))
}

pub async fn revoke_permission(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PermissionRequest>,
) -> Result<Json<ApiResponse<MessageDto>>, ApiError> {
    state
        .permission_service()
        .revoke(payload.user_id, payload.permission)
        .await?;

    Ok(Json(ApiResponse::success(MessageDto::new(format!(
        "Revoked {} from user {}",
        payload.permission, payload.user_id
    )))))
}
