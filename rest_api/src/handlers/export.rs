// rest_api/src/handlers/export.rs

use axum::{
    extract::{Extension, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use serde::Deserialize;

use models::{DomainError, Role, Student};
use security::AuthContext;

use crate::error::ApiResult;
use crate::AppState;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const TOP_MARGIN_MM: f32 = 277.0;
const BOTTOM_MARGIN_MM: f32 = 15.0;
const LINE_HEIGHT_MM: f32 = 6.0;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ExportQuery {
    pub date: Option<String>,
}

/// Renders the (optionally date-filtered) student roster as a one-line-
/// per-student PDF.
pub async fn students_pdf(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    security::require_role(&ctx, &[Role::Admin])?;
    let students: Vec<Student> = state
        .storage
        .students
        .all()?
        .into_iter()
        .filter(|s| match &query.date {
            Some(date) => s.date == *date,
            None => true,
        })
        .collect();

    let title = match &query.date {
        Some(date) => format!("Student Roster {}", date),
        None => "Student Roster".to_string(),
    };

    let (doc, first_page, first_layer) =
        PdfDocument::new(&title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "roster");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| DomainError::Internal(format!("pdf font error: {}", e)))?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    let mut y = TOP_MARGIN_MM;
    layer.use_text(&title, 14.0, Mm(15.0), Mm(y), &font);
    y -= 2.0 * LINE_HEIGHT_MM;

    for student in &students {
        if y < BOTTOM_MARGIN_MM {
            let (page, page_layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "roster");
            layer = doc.get_page(page).get_layer(page_layer);
            y = TOP_MARGIN_MM;
        }
        let line = format!(
            "{}  {}  flight {}  arrives {}  pickup {}  {}",
            student.student_no,
            student.full_name(),
            student.flight_number,
            student.arrival_time,
            student.pickup_time,
            student.school,
        );
        layer.use_text(&line, 10.0, Mm(15.0), Mm(y), &font);
        y -= LINE_HEIGHT_MM;
    }

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| DomainError::Internal(format!("pdf render error: {}", e)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"students.pdf\"",
            ),
        ],
        bytes,
    )
        .into_response())
}
