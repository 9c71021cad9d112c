// rest_api/src/handlers/excel_upload.rs

use axum::{
    extract::{Extension, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use importer::{expected_headers, import_sheet, SheetFormat};
use models::{DomainError, Role};
use security::AuthContext;

use crate::envelope;
use crate::error::ApiResult;
use crate::AppState;

/// Bulk import: multipart upload carrying the spreadsheet plus optional
/// date/school/client defaults that fill in rows where the corresponding
/// column was empty or missing.
pub async fn upload(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    security::require_role(&ctx, &[Role::Admin])?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut date = String::new();
    let mut school = String::new();
    let mut client = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DomainError::MalformedInput(format!("bad multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload.xlsx").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| DomainError::MalformedInput(format!("bad upload: {}", e)))?;
                file = Some((filename, bytes.to_vec()));
            }
            "date" => date = read_text(field).await?,
            "school" => school = read_text(field).await?,
            "client" => client = read_text(field).await?,
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or_else(|| {
        DomainError::invalid_field("file", "a spreadsheet file part is required")
    })?;
    let format = SheetFormat::from_filename(&filename);
    let mapped = import_sheet(&bytes, format)?;

    let mut imported = Vec::new();
    let mut failed = Vec::new();
    for entry in mapped {
        let mut record = entry.record;
        if record.date.is_empty() {
            record.date = date.clone();
        }
        if record.school.is_empty() {
            record.school = school.clone();
        }
        if record.client.is_empty() {
            record.client = client.clone();
        }
        match state.storage.create_student(record) {
            Ok(student) => imported.push(student),
            Err(e) => failed.push(json!({ "row": entry.row, "message": e.to_string() })),
        }
    }

    tracing::info!(
        imported = imported.len(),
        failed = failed.len(),
        filename,
        "bulk import finished"
    );
    Ok(envelope::ok_with(
        "import finished",
        json!({
            "imported": imported.len(),
            "students": imported,
            "failed": failed,
        }),
    ))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> ApiResult<String> {
    Ok(field
        .text()
        .await
        .map_err(|e| DomainError::MalformedInput(format!("bad multipart field: {}", e)))?
        .trim()
        .to_string())
}

/// Downloadable import template: the exact header row the mapper expects,
/// as CSV so any spreadsheet tool opens it.
pub async fn template(Extension(ctx): Extension<AuthContext>) -> ApiResult<Response> {
    security::require_role(&ctx, &[Role::Admin])?;
    let body = format!("{}\n", expected_headers().join(","));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"student-import-template.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}
