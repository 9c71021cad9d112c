// rest_api/src/lib.rs

use std::sync::Arc;

use axum::{
    http::{Method, StatusCode},
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use security::JwtKeys;
use storage::Storage;

pub mod config;
pub mod envelope;
pub mod error;
pub mod geocode;
pub mod handlers;

use config::AppConfig;
use geocode::GeocodeClient;
use handlers::{assignments, auth, excel_upload, export, operations, students, users};

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub jwt: JwtKeys,
    pub geocoder: Arc<GeocodeClient>,
}

impl AppState {
    pub fn new(storage: Arc<Storage>, config: &AppConfig) -> Self {
        AppState {
            jwt: JwtKeys::new(config.jwt_secret.as_bytes(), config.token_ttl_hours),
            geocoder: GeocodeClient::new(config.geocode_base_url.clone()),
            storage,
        }
    }
}

async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": "ok" })),
    )
}

/// Builds the full application router. Everything outside the auth
/// endpoints and admin self-registration sits behind the bearer gate.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/students", get(students::list).post(students::create))
        .route("/api/students/export/pdf", get(export::students_pdf))
        .route(
            "/api/students/:id",
            get(students::read)
                .put(students::update)
                .delete(students::remove),
        )
        .route("/api/users", get(users::list_all).post(users::create))
        .route("/api/users/role/:role", get(users::list_by_role))
        .route(
            "/api/users/:id",
            get(users::read).put(users::update).delete(users::remove),
        )
        .route(
            "/api/assignments",
            get(assignments::list).post(assignments::create),
        )
        .route(
            "/api/assignments/unassigned-students",
            get(assignments::unassigned),
        )
        .route("/api/assignments/drivers", get(assignments::drivers))
        .route("/api/assignments/:id", delete(assignments::cancel))
        .route(
            "/api/driver/update-pickup/:id",
            put(operations::driver_update_pickup),
        )
        .route(
            "/api/driver/update-delivery/:id",
            put(operations::driver_update_delivery),
        )
        .route(
            "/api/driver/profile",
            get(operations::driver_profile).put(operations::driver_update_profile),
        )
        .route(
            "/api/subdriver/update-pickup/:id",
            put(operations::subdriver_update_pickup),
        )
        .route(
            "/api/subdriver/update-delivery/:id",
            put(operations::subdriver_update_delivery),
        )
        .route(
            "/api/subdriver/profile",
            get(operations::subdriver_profile).put(operations::subdriver_update_profile),
        )
        .route("/api/excel-upload/students", post(excel_upload::upload))
        .route("/api/excel-upload/template", get(excel_upload::template))
        .route("/api/geocode", get(geocode::lookup_handler))
        .layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            security::middleware::require_bearer,
        ));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/login", post(auth::admin_login))
        .route("/api/auth/user/login", post(auth::user_login))
        .route("/api/users/register-admin", post(users::register_admin))
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
