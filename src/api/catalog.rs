//! Browse and search endpoints.

use axum::extract::{Path, Query, State};

use super::{error, success, ApiResult};
use crate::catalog::{
    department_list, search_page, semester_list, subject_list, subject_page, CatalogFilter,
    DepartmentSummary, Lookup, SearchPage, SemesterListPage, SubjectListPage, SubjectPage,
};
use crate::AppState;

/// GET /api/departments - List departments.
pub async fn list_departments(State(state): State<AppState>) -> ApiResult<Vec<DepartmentSummary>> {
    match state.client.departments().await {
        Ok(snapshot) => success(department_list(&snapshot.departments), snapshot.revision),
        Err(e) => error(e, state.client.revision().await),
    }
}

/// GET /api/departments/:department_id - Semesters of a department.
pub async fn get_department(
    State(state): State<AppState>,
    Path(department_id): Path<String>,
) -> ApiResult<Lookup<SemesterListPage>> {
    match state.client.departments().await {
        Ok(snapshot) => success(
            semester_list(&snapshot.departments, &department_id),
            snapshot.revision,
        ),
        Err(e) => error(e, state.client.revision().await),
    }
}

/// GET /api/departments/:department_id/semesters/:semester_id - Subjects of a semester.
pub async fn get_semester(
    State(state): State<AppState>,
    Path((department_id, semester_id)): Path<(String, String)>,
) -> ApiResult<Lookup<SubjectListPage>> {
    match state.client.departments().await {
        Ok(snapshot) => success(
            subject_list(&snapshot.departments, &department_id, &semester_id),
            snapshot.revision,
        ),
        Err(e) => error(e, state.client.revision().await),
    }
}

/// GET /api/departments/:department_id/semesters/:semester_id/subjects/:subject_id
pub async fn get_subject(
    State(state): State<AppState>,
    Path((department_id, semester_id, subject_id)): Path<(String, String, String)>,
) -> ApiResult<Lookup<SubjectPage>> {
    match state.client.departments().await {
        Ok(snapshot) => success(
            subject_page(&snapshot.departments, &department_id, &semester_id, &subject_id),
            snapshot.revision,
        ),
        Err(e) => error(e, state.client.revision().await),
    }
}

/// GET /api/search - Filter resources by keyword, location and type.
pub async fn search_resources(
    State(state): State<AppState>,
    Query(filter): Query<CatalogFilter>,
) -> ApiResult<SearchPage> {
    match state.client.departments().await {
        Ok(snapshot) => {
            let page = search_page(&snapshot.departments, &filter);
            tracing::debug!(keyword = filter.keyword(), "Search served");
            success(page, snapshot.revision)
        }
        Err(e) => error(e, state.client.revision().await),
    }
}
