// rest_api/tests/api_flow.rs
//
// Drives the full router in-process with tower's oneshot, against a
// temporary sled database.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use rest_api::{app, config::AppConfig, AppState};
use storage::Storage;

fn test_app() -> Router {
    let storage = Storage::temporary().unwrap();
    let config = AppConfig::default();
    app(AppState::new(storage, &config))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Registers an admin and returns a bearer token for it.
async fn admin_token(router: &Router) -> String {
    let (status, _) = send(
        router,
        json_request(
            "POST",
            "/api/users/register-admin",
            None,
            json!({
                "username": "root",
                "email": "root@limousine.test",
                "password": "rootpw",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        router,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "root@limousine.test", "password": "rootpw" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().unwrap().to_string()
}

/// Creates a driver user through the admin API, returning its id.
async fn create_driver(router: &Router, token: &str, username: &str) -> String {
    let (status, body) = send(
        router,
        json_request(
            "POST",
            "/api/users",
            Some(token),
            json!({
                "username": username,
                "email": format!("{}@limousine.test", username),
                "password": "driverpw",
                "role": "Driver",
                "driver_id": format!("ID-{}", username),
                "vehicle_number": "VAN-3",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "driver create failed: {}", body);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn user_token(router: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        router,
        json_request(
            "POST",
            "/api/auth/user/login",
            None,
            json!({ "email": email, "password": password }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_open() {
    let router = test_app();
    let (status, body) = send(&router, get_request("/api/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let router = test_app();
    let (status, body) = send(&router, get_request("/api/students", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&router, get_request("/api/students", Some("garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_paths_are_role_isolated() {
    let router = test_app();
    let token = admin_token(&router).await;
    create_driver(&router, &token, "d1").await;

    // Admin login with a driver email is refused.
    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "d1@limousine.test", "password": "driverpw" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    // User login with the admin email is refused.
    let (status, _) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/user/login",
            None,
            json!({ "email": "root@limousine.test", "password": "rootpw" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The right doors still open.
    user_token(&router, "d1@limousine.test", "driverpw").await;
}

#[tokio::test]
async fn wrong_password_is_unauthenticated() {
    let router = test_app();
    admin_token(&router).await;
    let (status, _) = send(
        &router,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "root@limousine.test", "password": "nope" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn assign_flow_end_to_end() {
    let router = test_app();
    let token = admin_token(&router).await;
    let driver_id = create_driver(&router, &token, "d1").await;

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/students",
            Some(&token),
            json!({ "given_name": "Ann", "family_name": "Lee", "date": "2025-01-01" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let student_id = body["data"]["id"].as_str().unwrap().to_string();

    // S1 starts in the unassigned pool.
    let (_, body) = send(
        &router,
        get_request(
            "/api/assignments/unassigned-students?date=2025-01-01",
            Some(&token),
        ),
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/assignments",
            Some(&token),
            json!({
                "student_ids": [student_id],
                "driver_id": driver_id,
                "date": "2025-01-01",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "assign failed: {}", body);
    let assignment_id = body["data"][0]["id"].as_str().unwrap().to_string();

    // Pool is now empty; the driver's listing holds one pending record.
    let (_, body) = send(
        &router,
        get_request(
            "/api/assignments/unassigned-students?date=2025-01-01",
            Some(&token),
        ),
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (_, body) = send(
        &router,
        get_request(
            &format!("/api/assignments?driver_id={}", driver_id),
            Some(&token),
        ),
    )
    .await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["pickup"]["status"], "Pending");
    assert_eq!(items[0]["delivery"]["status"], "Pending");
    assert_eq!(items[0]["student"]["name"], "Ann Lee");

    // A second assignment for the same student and date conflicts.
    let (status, _) = send(
        &router,
        json_request(
            "POST",
            "/api/assignments",
            Some(&token),
            json!({
                "student_ids": [items[0]["student_id"]],
                "driver_id": driver_id,
                "date": "2025-01-01",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Cancelling returns the student to the pool.
    let (status, _) = send(
        &router,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/assignments/{}", assignment_id))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &router,
        get_request(
            "/api/assignments/unassigned-students?date=2025-01-01",
            Some(&token),
        ),
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn neither_or_both_targets_is_a_validation_error() {
    let router = test_app();
    let token = admin_token(&router).await;
    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/assignments",
            Some(&token),
            json!({ "student_ids": ["s-1"], "date": "2025-01-01" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["fields"][0], "driver_id");
}

#[tokio::test]
async fn only_the_assigned_driver_or_admin_updates_status() {
    let router = test_app();
    let token = admin_token(&router).await;
    let d1 = create_driver(&router, &token, "d1").await;
    create_driver(&router, &token, "d2").await;

    let (_, body) = send(
        &router,
        json_request(
            "POST",
            "/api/students",
            Some(&token),
            json!({ "given_name": "Bo", "date": "2025-01-01" }),
        ),
    )
    .await;
    let student_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(
        &router,
        json_request(
            "POST",
            "/api/assignments",
            Some(&token),
            json!({ "student_ids": [student_id], "driver_id": d1, "date": "2025-01-01" }),
        ),
    )
    .await;
    let assignment_id = body["data"][0]["id"].as_str().unwrap().to_string();

    let d1_token = user_token(&router, "d1@limousine.test", "driverpw").await;
    let d2_token = user_token(&router, "d2@limousine.test", "driverpw").await;

    // The other driver is rejected.
    let (status, _) = send(
        &router,
        json_request(
            "PUT",
            &format!("/api/driver/update-pickup/{}", assignment_id),
            Some(&d2_token),
            json!({ "status": "Completed" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The assigned driver completes pickup, then reverts it.
    let (status, body) = send(
        &router,
        json_request(
            "PUT",
            &format!("/api/driver/update-pickup/{}", assignment_id),
            Some(&d1_token),
            json!({ "status": "Completed" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pickup"]["status"], "Completed");
    assert!(!body["data"]["pickup"]["completed_at"].is_null());

    let (_, body) = send(
        &router,
        json_request(
            "PUT",
            &format!("/api/driver/update-pickup/{}", assignment_id),
            Some(&d1_token),
            json!({ "status": "Pending" }),
        ),
    )
    .await;
    assert_eq!(body["data"]["pickup"]["status"], "Pending");
    assert!(body["data"]["pickup"]["completed_at"].is_null());

    // Admin may update any assignment.
    let (status, _) = send(
        &router,
        json_request(
            "PUT",
            &format!("/api/driver/update-delivery/{}", assignment_id),
            Some(&token),
            json!({ "status": "Completed" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn driver_listing_is_scoped_to_self() {
    let router = test_app();
    let token = admin_token(&router).await;
    let d1 = create_driver(&router, &token, "d1").await;
    let d2 = create_driver(&router, &token, "d2").await;

    for (name, driver) in [("Ann", &d1), ("Bo", &d2)] {
        let (_, body) = send(
            &router,
            json_request(
                "POST",
                "/api/students",
                Some(&token),
                json!({ "given_name": name, "date": "2025-01-01" }),
            ),
        )
        .await;
        let student_id = body["data"]["id"].as_str().unwrap().to_string();
        send(
            &router,
            json_request(
                "POST",
                "/api/assignments",
                Some(&token),
                json!({ "student_ids": [student_id], "driver_id": driver, "date": "2025-01-01" }),
            ),
        )
        .await;
    }

    let d1_token = user_token(&router, "d1@limousine.test", "driverpw").await;
    let (_, body) = send(&router, get_request("/api/assignments", Some(&d1_token))).await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["student"]["name"], "Ann");

    // Admin sees both.
    let (_, body) = send(&router, get_request("/api/assignments", Some(&token))).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn csv_upload_imports_name_bearing_rows_only() {
    let router = test_app();
    let token = admin_token(&router).await;

    let csv = "Student Given Name,Student Family Name,School,Client\nAnn,Lee,ILSC,ILSC\n,,ILSC,ILSC\n";
    let boundary = "limousine-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"students.csv\"\r\nContent-Type: text/csv\r\n\r\n{csv}\r\n--{b}\r\nContent-Disposition: form-data; name=\"date\"\r\n\r\n2025-01-01\r\n--{b}\r\nContent-Disposition: form-data; name=\"school\"\r\n\r\nFallback\r\n--{b}\r\nContent-Disposition: form-data; name=\"client\"\r\n\r\nFallback\r\n--{b}--\r\n",
        b = boundary,
        csv = csv,
    );

    let request = Request::builder()
        .method("POST")
        .uri("/api/excel-upload/students")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK, "upload failed: {}", body);
    assert_eq!(body["data"]["imported"], 1);
    let student = &body["data"]["students"][0];
    assert_eq!(student["given_name"], "Ann");
    assert_eq!(student["family_name"], "Lee");
    // Sheet values win over the form defaults; the blank date comes from the form.
    assert_eq!(student["school"], "ILSC");
    assert_eq!(student["date"], "2025-01-01");

    // The imported student is findable through the directory.
    let (_, body) = send(&router, get_request("/api/students?search=lee", Some(&token))).await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn template_download_carries_the_expected_headers() {
    let router = test_app();
    let token = admin_token(&router).await;
    let response = router
        .clone()
        .oneshot(get_request("/api/excel-upload/template", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/csv"));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("Student No,"));
    assert!(text.contains("Student Given Name"));
}

#[tokio::test]
async fn non_admin_cannot_manage_users() {
    let router = test_app();
    let token = admin_token(&router).await;
    create_driver(&router, &token, "d1").await;
    let d1_token = user_token(&router, "d1@limousine.test", "driverpw").await;

    let (status, _) = send(&router, get_request("/api/users", Some(&d1_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&router, get_request("/api/users", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let router = test_app();
    admin_token(&router).await;
    let (status, _) = send(
        &router,
        json_request(
            "POST",
            "/api/users/register-admin",
            None,
            json!({
                "username": "root2",
                "email": "root@limousine.test",
                "password": "pw",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
