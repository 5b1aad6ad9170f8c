//! Caller account endpoints.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;

use super::{error, success, ApiResult};
use crate::auth::caller_from_headers;
use crate::models::{CallerInfo, SaveProfileRequest, UserProfile, UserRole};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub role: UserRole,
}

/// GET /api/me - Who the gateway thinks the caller is.
pub async fn get_me(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<CallerInfo> {
    let caller = caller_from_headers(&headers);
    let principal = caller.principal().map(String::from);
    success(
        CallerInfo {
            authenticated: principal.is_some(),
            principal,
        },
        state.client.revision().await,
    )
}

/// GET /api/me/role - Role of the caller.
pub async fn get_my_role(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<RoleResponse> {
    let caller = caller_from_headers(&headers);
    let revision_id = state.client.revision().await;

    match state.client.caller_role(&caller).await {
        Ok(role) => success(RoleResponse { role }, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/me/profile - Profile of the caller, null when none is saved.
pub async fn get_my_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Option<UserProfile>> {
    let caller = caller_from_headers(&headers);
    let revision_id = state.client.revision().await;

    match state.client.caller_profile(&caller).await {
        Ok(profile) => success(profile, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/me/profile - Save the caller's profile.
pub async fn save_my_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SaveProfileRequest>,
) -> ApiResult<UserProfile> {
    let caller = caller_from_headers(&headers);
    let revision_id = state.client.revision().await;

    match state.client.save_caller_profile(&caller, &request.name).await {
        Ok(profile) => success(profile, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/users/:principal/profile - Another user's profile (own profile or admin only).
pub async fn get_user_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(principal): Path<String>,
) -> ApiResult<Option<UserProfile>> {
    let caller = caller_from_headers(&headers);
    let revision_id = state.client.revision().await;

    match state.client.user_profile(&caller, &principal).await {
        Ok(profile) => success(profile, revision_id),
        Err(e) => error(e, revision_id),
    }
}
