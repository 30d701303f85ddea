//! Family handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use famedu_core::services::FamilyDetails;
use famedu_core::Family;
use famedu_shared::Pagination;
use uuid::Uuid;

use crate::dto::{CreateFamilyRequest, PageParams};
use crate::error::ApiError;
use crate::middleware::{AuthUser, ClientContext, ValidatedJson};
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/families
pub async fn list_families(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<ApiResponse<Vec<Family>>>, ApiError> {
    let families = state
        .families
        .list_families(&user.principal(), Pagination::new(params.page, params.per_page))
        .await?;
    Ok(Json(ApiResponse::success(families)))
}

/// POST /api/v1/families
pub async fn create_family(
    State(state): State<AppState>,
    user: AuthUser,
    ClientContext(ctx): ClientContext,
    ValidatedJson(payload): ValidatedJson<CreateFamilyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Family>>), ApiError> {
    let family = state
        .families
        .create_family(&user.principal(), payload.name, payload.timezone, &ctx)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(family))))
}

/// GET /api/v1/families/{id}
pub async fn get_family(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FamilyDetails>>, ApiError> {
    let details = state.families.get_family(&user.principal(), id).await?;
    Ok(Json(ApiResponse::success(details)))
}
