use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::{
    ActorQuery, ApiError, ApiResponse, AppState, CreateLogRequest, DeletedCountDto, MessageDto,
};
use crate::db::LogEntry;
use crate::domain::PRIMARY_ADMIN_ID;
use crate::services::AuditError;

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::NotFound(id) => Self::not_found("Log entry", id),
            AuditError::PermissionDenied(msg) => Self::forbidden(msg),
            AuditError::Database(msg) => Self::database(msg),
        }
    }
}

pub async fn list_logs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<LogEntry>>>, ApiError> {
    let logs = state.audit_service().list_all().await?;
    Ok(Json(ApiResponse::success(logs)))
}

pub async fn create_log(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateLogRequest>,
) -> Result<Json<ApiResponse<LogEntry>>, ApiError> {
    if payload.action.trim().is_empty() {
        return Err(ApiError::validation("action is required"));
    }

    let entry = state
        .audit_service()
        .append(
            &payload.mac,
            &payload.hostname,
            &payload.action,
            Some(payload.performed_by.unwrap_or(PRIMARY_ADMIN_ID)),
        )
        .await?;

    Ok(Json(ApiResponse::success(entry)))
}

/// `DELETE /api/logs/{id}?user_id=`
pub async fn delete_log(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(actor): Query<ActorQuery>,
) -> Result<Json<ApiResponse<MessageDto>>, ApiError> {
    state.audit_service().delete_one(id, actor.user_id).await?;
    Ok(Json(ApiResponse::success(MessageDto::new(
        "Log deleted successfully",
    ))))
}

/// `DELETE /api/logs?user_id=`
pub async fn delete_all_logs(
    State(state): State<Arc<AppState>>,
    Query(actor): Query<ActorQuery>,
) -> Result<Json<ApiResponse<DeletedCountDto>>, ApiError> {
    let deleted = state.audit_service().delete_all(actor.user_id).await?;
    Ok(Json(ApiResponse::success(DeletedCountDto { deleted })))
}
