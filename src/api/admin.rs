//! Admin console endpoints.
//!
//! Everything except [`admin_status`] sits behind `auth::admin_guard_layer`, which
//! injects the authorized [`Caller`].

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Extension, Json,
};
use serde::Serialize;

use super::{error, success, ApiResult};
use crate::auth::{caller_from_headers, check_admin, GateState};
use crate::catalog::{managed_resources, ResourceWithContext};
use crate::client::ClientError;
use crate::models::{AssignRoleRequest, CreateNodeRequest, RenameNodeRequest, ResourceRequest};
use crate::remote::{Caller, SubjectRef};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatus {
    #[serde(flatten)]
    pub gate: GateState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
}

/// Success carries the post-invalidation revision.
async fn settle(state: &AppState, result: Result<(), ClientError>) -> ApiResult<()> {
    let revision_id = state.client.revision().await;
    match result {
        Ok(()) => success((), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/admin/status - Gate state for the caller. Not guarded.
pub async fn admin_status(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<AdminStatus> {
    let caller = caller_from_headers(&headers);
    let gate = check_admin(&state.client, &caller).await;

    success(
        AdminStatus {
            placeholder: gate.placeholder(),
            gate: gate.state().clone(),
            principal: caller.principal().map(String::from),
        },
        state.client.revision().await,
    )
}

/// GET /api/admin/resources - Every resource with its department, semester and subject.
pub async fn list_managed_resources(State(state): State<AppState>) -> ApiResult<Vec<ResourceWithContext>> {
    match state.client.departments().await {
        Ok(snapshot) => success(managed_resources(&snapshot.departments), snapshot.revision),
        Err(e) => error(e, state.client.revision().await),
    }
}

/// POST /api/admin/departments
pub async fn create_department(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<CreateNodeRequest>,
) -> ApiResult<()> {
    let result = state
        .client
        .add_department(&caller, &request.id, &request.name)
        .await;
    settle(&state, result).await
}

/// PUT /api/admin/departments/:department_id
pub async fn rename_department(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(department_id): Path<String>,
    Json(request): Json<RenameNodeRequest>,
) -> ApiResult<()> {
    let result = state
        .client
        .edit_department(&caller, &department_id, &request.name)
        .await;
    settle(&state, result).await
}

/// DELETE /api/admin/departments/:department_id
pub async fn delete_department(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(department_id): Path<String>,
) -> ApiResult<()> {
    let result = state.client.remove_department(&caller, &department_id).await;
    settle(&state, result).await
}

/// POST /api/admin/departments/:department_id/semesters
pub async fn create_semester(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(department_id): Path<String>,
    Json(request): Json<CreateNodeRequest>,
) -> ApiResult<()> {
    let result = state
        .client
        .add_semester(&caller, &department_id, &request.id, &request.name)
        .await;
    settle(&state, result).await
}

/// PUT /api/admin/departments/:department_id/semesters/:semester_id
pub async fn rename_semester(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((department_id, semester_id)): Path<(String, String)>,
    Json(request): Json<RenameNodeRequest>,
) -> ApiResult<()> {
    let result = state
        .client
        .edit_semester(&caller, &department_id, &semester_id, &request.name)
        .await;
    settle(&state, result).await
}

/// DELETE /api/admin/departments/:department_id/semesters/:semester_id
pub async fn delete_semester(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((department_id, semester_id)): Path<(String, String)>,
) -> ApiResult<()> {
    let result = state
        .client
        .remove_semester(&caller, &department_id, &semester_id)
        .await;
    settle(&state, result).await
}

/// POST .../semesters/:semester_id/subjects
pub async fn create_subject(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((department_id, semester_id)): Path<(String, String)>,
    Json(request): Json<CreateNodeRequest>,
) -> ApiResult<()> {
    let result = state
        .client
        .add_subject(&caller, &department_id, &semester_id, &request.id, &request.name)
        .await;
    settle(&state, result).await
}

/// PUT .../subjects/:subject_id
pub async fn rename_subject(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((department_id, semester_id, subject_id)): Path<(String, String, String)>,
    Json(request): Json<RenameNodeRequest>,
) -> ApiResult<()> {
    let subject = SubjectRef {
        department_id,
        semester_id,
        subject_id,
    };
    let result = state
        .client
        .edit_subject(&caller, &subject, &request.name)
        .await;
    settle(&state, result).await
}

/// DELETE .../subjects/:subject_id
pub async fn delete_subject(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((department_id, semester_id, subject_id)): Path<(String, String, String)>,
) -> ApiResult<()> {
    let subject = SubjectRef {
        department_id,
        semester_id,
        subject_id,
    };
    let result = state.client.remove_subject(&caller, &subject).await;
    settle(&state, result).await
}

/// POST .../subjects/:subject_id/resources
pub async fn create_resource(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((department_id, semester_id, subject_id)): Path<(String, String, String)>,
    Json(request): Json<ResourceRequest>,
) -> ApiResult<()> {
    let subject = SubjectRef {
        department_id,
        semester_id,
        subject_id,
    };
    let result = state
        .client
        .add_resource(&caller, &subject, &request.title, &request.content)
        .await;
    settle(&state, result).await
}

/// PUT .../resources/:resource_id
pub async fn update_resource(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((department_id, semester_id, subject_id, resource_id)): Path<(String, String, String, u64)>,
    Json(request): Json<ResourceRequest>,
) -> ApiResult<()> {
    let subject = SubjectRef {
        department_id,
        semester_id,
        subject_id,
    };
    let result = state
        .client
        .edit_resource(&caller, &subject, resource_id, &request.title, &request.content)
        .await;
    settle(&state, result).await
}

/// DELETE .../resources/:resource_id
pub async fn delete_resource(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((department_id, semester_id, subject_id, resource_id)): Path<(String, String, String, u64)>,
) -> ApiResult<()> {
    let subject = SubjectRef {
        department_id,
        semester_id,
        subject_id,
    };
    let result = state
        .client
        .remove_resource(&caller, &subject, resource_id)
        .await;
    settle(&state, result).await
}

/// POST /api/admin/roles - Assign a role to a principal.
pub async fn assign_role(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<AssignRoleRequest>,
) -> ApiResult<()> {
    let result = state
        .client
        .assign_role(&caller, &request.user, request.role)
        .await;
    settle(&state, result).await
}
