// rest_api/src/handlers/auth.rs
//
// Two deliberately separate login paths: the admin console logs in
// through /api/auth/login and only accepts Admin credentials; every other
// role goes through /api/auth/user/login, which refuses Admin emails.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use models::{DomainError, Role, User, UserView};

use crate::envelope;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn verify_credentials(state: &AppState, login: &LoginRequest) -> ApiResult<User> {
    let user = state
        .storage
        .users
        .find_by_email(&login.email)?
        .ok_or_else(|| DomainError::Unauthenticated("invalid email or password".to_string()))?;
    if !User::verify_password(&login.password, &user.password_hash)
        .map_err(DomainError::from)?
    {
        return Err(DomainError::Unauthenticated("invalid email or password".to_string()).into());
    }
    Ok(user)
}

fn login_response(state: &AppState, user: &User) -> ApiResult<Json<Value>> {
    let token = security::issue_token(&state.jwt, user)?;
    tracing::info!(user_id = %user.id, role = %user.role(), "login");
    Ok(envelope::ok_with(
        "login successful",
        json!({ "token": token, "user": UserView::from(user) }),
    ))
}

pub async fn admin_login(
    State(state): State<AppState>,
    Json(login): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let user = verify_credentials(&state, &login)?;
    if user.role() != Role::Admin {
        return Err(DomainError::PermissionDenied(
            "this login is reserved for administrators".to_string(),
        )
        .into());
    }
    login_response(&state, &user)
}

pub async fn user_login(
    State(state): State<AppState>,
    Json(login): Json<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let user = verify_credentials(&state, &login)?;
    if user.role() == Role::Admin {
        return Err(DomainError::PermissionDenied(
            "administrators must use the admin login".to_string(),
        )
        .into());
    }
    login_response(&state, &user)
}
