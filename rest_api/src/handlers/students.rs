// rest_api/src/handlers/students.rs

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use models::{NewStudent, Role, StudentUpdate};
use security::AuthContext;
use storage::StudentFilter;

use crate::envelope;
use crate::error::ApiResult;
use crate::AppState;

/// Roles allowed to read the directory. Only admins may write it.
const READ_ROLES: &[Role] = &[Role::Admin, Role::School, Role::Greeter];

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ListQuery {
    pub date: Option<String>,
    pub search: Option<String>,
    pub page: usize,
    pub limit: usize,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Value>> {
    security::require_role(&ctx, READ_ROLES)?;
    let page = state.storage.students.list(&StudentFilter {
        date: query.date,
        search: query.search,
        page: query.page,
        per_page: query.limit,
    })?;
    Ok(envelope::ok(page))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(new): Json<NewStudent>,
) -> ApiResult<Json<Value>> {
    security::require_role(&ctx, &[Role::Admin])?;
    let student = state.storage.create_student(new)?;
    Ok(envelope::ok_with("student created", student))
}

pub async fn read(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    security::require_role(&ctx, READ_ROLES)?;
    Ok(envelope::ok(state.storage.students.get(&id)?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(patch): Json<StudentUpdate>,
) -> ApiResult<Json<Value>> {
    security::require_role(&ctx, &[Role::Admin])?;
    let student = state.storage.students.update(&id, patch)?;
    Ok(envelope::ok_with("student updated", student))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    security::require_role(&ctx, &[Role::Admin])?;
    state.storage.students.delete(&id)?;
    Ok(envelope::ok_message("student deleted"))
}
