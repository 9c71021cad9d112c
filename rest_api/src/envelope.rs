// rest_api/src/envelope.rs
//
// Every JSON response shares the `{ success, message?, data? }` shape.

use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

pub fn ok(data: impl Serialize) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

pub fn ok_message(message: &str) -> Json<Value> {
    Json(json!({ "success": true, "message": message }))
}

pub fn ok_with(message: &str, data: impl Serialize) -> Json<Value> {
    Json(json!({ "success": true, "message": message, "data": data }))
}
