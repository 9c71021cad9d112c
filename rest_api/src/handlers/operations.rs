// rest_api/src/handlers/operations.rs
//
// Driver- and subdriver-facing routes: status updates on their own
// assignments and their own profile. Both role surfaces share the same
// handlers, parameterized by the expected role, mounted under
// /api/driver/* and /api/subdriver/*.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use models::{Assignment, DomainError, Role, TaskStatus, UserUpdate, UserView};
use security::AuthContext;

use crate::envelope;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: TaskStatus,
}

/// Admins may update any assignment; a driver or subdriver only their
/// own. Everyone else was already rejected by the role gate.
fn check_ownership(ctx: &AuthContext, assignment: &Assignment) -> ApiResult<()> {
    if ctx.role == Role::Admin || assignment.belongs_to(&ctx.user_id) {
        Ok(())
    } else {
        Err(DomainError::PermissionDenied(
            "this assignment belongs to another driver".to_string(),
        )
        .into())
    }
}

async fn update_status(
    state: &AppState,
    ctx: &AuthContext,
    role: Role,
    id: &str,
    status: TaskStatus,
    pickup: bool,
) -> ApiResult<Json<Value>> {
    security::require_role(ctx, &[role, Role::Admin])?;
    let assignment = state.storage.assignments.get(id)?;
    check_ownership(ctx, &assignment)?;
    let updated = if pickup {
        state.storage.assignments.update_pickup(id, status)?
    } else {
        state.storage.assignments.update_delivery(id, status)?
    };
    tracing::info!(
        assignment_id = id,
        user_id = %ctx.user_id,
        ?status,
        pickup,
        "status updated"
    );
    Ok(envelope::ok_with("status updated", updated))
}

async fn profile(state: &AppState, ctx: &AuthContext, role: Role) -> ApiResult<Json<Value>> {
    security::require_role(ctx, &[role])?;
    let user = state.storage.users.get(&ctx.user_id)?;
    Ok(envelope::ok(UserView::from(&user)))
}

async fn update_profile(
    state: &AppState,
    ctx: &AuthContext,
    role: Role,
    patch: UserUpdate,
) -> ApiResult<Json<Value>> {
    security::require_role(ctx, &[role])?;
    let user = state.storage.users.update(&ctx.user_id, patch)?;
    Ok(envelope::ok_with("profile updated", UserView::from(&user)))
}

// /api/driver/*

pub async fn driver_update_pickup(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Json<Value>> {
    update_status(&state, &ctx, Role::Driver, &id, request.status, true).await
}

pub async fn driver_update_delivery(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Json<Value>> {
    update_status(&state, &ctx, Role::Driver, &id, request.status, false).await
}

pub async fn driver_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Value>> {
    profile(&state, &ctx, Role::Driver).await
}

pub async fn driver_update_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(patch): Json<UserUpdate>,
) -> ApiResult<Json<Value>> {
    update_profile(&state, &ctx, Role::Driver, patch).await
}

// /api/subdriver/*

pub async fn subdriver_update_pickup(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Json<Value>> {
    update_status(&state, &ctx, Role::Subdriver, &id, request.status, true).await
}

pub async fn subdriver_update_delivery(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Json<Value>> {
    update_status(&state, &ctx, Role::Subdriver, &id, request.status, false).await
}

pub async fn subdriver_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Value>> {
    profile(&state, &ctx, Role::Subdriver).await
}

pub async fn subdriver_update_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(patch): Json<UserUpdate>,
) -> ApiResult<Json<Value>> {
    update_profile(&state, &ctx, Role::Subdriver, patch).await
}
