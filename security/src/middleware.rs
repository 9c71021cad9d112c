// security/src/middleware.rs

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{validate_token, AuthContext, JwtKeys};

fn unauthenticated(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "message": message })),
    )
        .into_response()
}

/// Bearer-token gate for every non-auth route. On success the decoded
/// [`AuthContext`] is inserted into request extensions for handlers to
/// pick up with `Extension<AuthContext>`.
pub async fn require_bearer(
    State(keys): State<JwtKeys>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "));

    let token = match token {
        Some(token) => token,
        None => return unauthenticated("missing bearer token"),
    };

    match validate_token(&keys, token) {
        Ok(claims) => {
            request.extensions_mut().insert(AuthContext::from(claims));
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "rejected bearer token");
            unauthenticated("invalid or expired token")
        }
    }
}
