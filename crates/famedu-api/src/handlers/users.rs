// ============================================================================
// FamEdu API - User Handlers
// File: crates/famedu-api/src/handlers/users.rs
// ============================================================================

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use famedu_core::services::{CreateUserInput, ListUsersQuery, UpdateProfileInput, UserInfo};
use famedu_shared::Page;
use uuid::Uuid;

use crate::dto::{
    CreateUserRequest, ListUsersParams, MessageResponse, ResetPasswordRequest, SetStatusRequest,
    UpdateUserRequest,
};
use crate::error::ApiError;
use crate::middleware::{AuthUser, ClientContext, ValidatedJson};
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListUsersParams>,
) -> Result<Json<ApiResponse<Page<UserInfo>>>, ApiError> {
    let query = ListUsersQuery {
        role: params.role()?,
        family_id: params.family_id,
        is_active: params.is_active,
        page: params.page,
        per_page: params.per_page,
    };
    let page = state.users.list_users(&user.principal(), query).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// POST /api/v1/users
pub async fn create_user(
    State(state): State<AppState>,
    user: AuthUser,
    ClientContext(ctx): ClientContext,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserInfo>>), ApiError> {
    let input = CreateUserInput {
        username: payload.username,
        password: payload.password,
        display_name: payload.display_name,
        role: payload.role,
        family_id: payload.family_id,
        year_level: payload.year_level,
    };
    let created = state.users.create_user(&user.principal(), input, &ctx).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// GET /api/v1/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let found = state.users.get_user(&user.principal(), id).await?;
    Ok(Json(ApiResponse::success(found)))
}

/// PATCH /api/v1/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    ClientContext(ctx): ClientContext,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let input = UpdateProfileInput {
        display_name: payload.display_name,
        year_level: payload.year_level,
    };
    let updated = state
        .users
        .update_profile(&user.principal(), id, input, &ctx)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// POST /api/v1/users/{id}/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    user: AuthUser,
    ClientContext(ctx): ClientContext,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .users
        .reset_password(&user.principal(), id, &payload.new_password, &ctx)
        .await?;
    Ok(Json(ApiResponse::success(MessageResponse::new("Password reset"))))
}

/// POST /api/v1/users/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    user: AuthUser,
    ClientContext(ctx): ClientContext,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SetStatusRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let updated = state
        .users
        .set_active(&user.principal(), id, payload.is_active, &ctx)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}
