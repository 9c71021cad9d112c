// rest_api/src/handlers/users.rs

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use models::{NewUser, Role, UserUpdate, UserView};
use security::AuthContext;

use crate::envelope;
use crate::error::ApiResult;
use crate::AppState;

fn views(users: &[models::User]) -> Vec<UserView> {
    users.iter().map(UserView::from).collect()
}

pub async fn list_all(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Value>> {
    security::require_role(&ctx, &[Role::Admin])?;
    Ok(envelope::ok(views(&state.storage.users.all()?)))
}

pub async fn list_by_role(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(role): Path<String>,
) -> ApiResult<Json<Value>> {
    security::require_role(&ctx, &[Role::Admin])?;
    let role: Role = role.parse()?;
    Ok(envelope::ok(views(&state.storage.users.list_by_role(role)?)))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(new): Json<NewUser>,
) -> ApiResult<Json<Value>> {
    security::require_role(&ctx, &[Role::Admin])?;
    let user = state.storage.users.create(new)?;
    Ok(envelope::ok_with("user created", UserView::from(&user)))
}

pub async fn read(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    security::require_role(&ctx, &[Role::Admin])?;
    Ok(envelope::ok(UserView::from(&state.storage.users.get(&id)?)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(patch): Json<UserUpdate>,
) -> ApiResult<Json<Value>> {
    security::require_role(&ctx, &[Role::Admin])?;
    let user = state.storage.users.update(&id, patch)?;
    Ok(envelope::ok_with("user updated", UserView::from(&user)))
}

/// Deleting a user detaches any assignments still pointing at them; the
/// assignments themselves survive.
pub async fn remove(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    security::require_role(&ctx, &[Role::Admin])?;
    state.storage.delete_user(&id)?;
    Ok(envelope::ok_message("user deleted"))
}

/// Open self-registration for the Admin role. The created account is
/// immediately active; only the entry path distinguishes it from an
/// admin-created one.
#[derive(Debug, Deserialize)]
pub struct RegisterAdminRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub gender: String,
}

pub async fn register_admin(
    State(state): State<AppState>,
    Json(request): Json<RegisterAdminRequest>,
) -> ApiResult<Json<Value>> {
    let user = state.storage.users.create(NewUser {
        username: request.username,
        email: request.email,
        password: request.password,
        gender: request.gender,
        role: Role::Admin,
        driver_id: None,
        subdriver_id: None,
        vehicle_number: None,
        school_id: None,
        greeter_id: None,
    })?;
    tracing::info!(user_id = %user.id, "admin self-registered");
    Ok(envelope::ok_with("admin registered", UserView::from(&user)))
}
