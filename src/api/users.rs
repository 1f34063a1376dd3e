use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CreateUserRequest, MessageDto};
use crate::db::User;
use crate::services::UserError;

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => Self::not_found("User", id),
            UserError::UsernameTaken(_) => Self::Conflict(err.to_string()),
            UserError::Forbidden => Self::forbidden(err.to_string()),
            UserError::Validation(msg) => Self::validation(msg),
            UserError::Database(msg) => Self::database(msg),
        }
    }
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let users = state.user_service().list().await?;
    Ok(Json(ApiResponse::success(users)))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state
        .user_service()
        .create(&payload.username, &payload.password_hash, payload.role)
        .await?;

    Ok(Json(ApiResponse::success(user)))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageDto>>, ApiError> {
    state.user_service().delete(id).await?;
    Ok(Json(ApiResponse::success(MessageDto::new(
        "User deleted successfully",
    ))))
}
