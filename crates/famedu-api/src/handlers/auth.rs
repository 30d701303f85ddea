// ============================================================================
// FamEdu API - Auth Handlers
// File: crates/famedu-api/src/handlers/auth.rs
// ============================================================================
//! Authentication HTTP handlers (login, register, refresh, logout, profile)

use axum::{extract::State, http::StatusCode, Json};
use famedu_core::services::{CurrentUser, LoginResult, RefreshResult, RegisterInput, RegisterResult};

use crate::dto::{ChangePasswordRequest, LoginRequest, MessageResponse, RefreshRequest, RegisterRequest};
use crate::error::ApiError;
use crate::middleware::{AuthUser, ClientContext, ValidatedJson};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Login handler - POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    ClientContext(ctx): ClientContext,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    let result = state.auth.login(&payload.username, &payload.password, &ctx).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Register handler - POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    ClientContext(ctx): ClientContext,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegisterResult>>), ApiError> {
    let input = RegisterInput {
        family_name: payload.family_name,
        timezone: payload.timezone,
        username: payload.username,
        password: payload.password,
        display_name: payload.display_name,
    };
    let result = state.auth.register(input, &ctx).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(result))))
}

/// Refresh token handler - POST /api/v1/auth/refresh
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshRequest>,
) -> Result<Json<ApiResponse<RefreshResult>>, ApiError> {
    let result = state.auth.refresh(&payload.refresh_token).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Logout handler - POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
    ClientContext(ctx): ClientContext,
) -> Json<ApiResponse<MessageResponse>> {
    state.auth.logout(&user.principal(), &ctx);
    Json(ApiResponse::success(MessageResponse::new("Logged out successfully")))
}

/// Current user with granted permission keys - GET /api/v1/auth/me
pub async fn me(AuthUser(user): AuthUser) -> Json<ApiResponse<CurrentUser>> {
    Json(ApiResponse::success(CurrentUser::from(&user)))
}

/// Change own password - POST /api/v1/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    ClientContext(ctx): ClientContext,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .auth
        .change_password(&user.principal(), &payload.current_password, &payload.new_password, &ctx)
        .await?;
    Ok(Json(ApiResponse::success(MessageResponse::new("Password changed"))))
}
