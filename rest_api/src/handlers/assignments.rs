// rest_api/src/handlers/assignments.rs

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use models::{Assignee, Assignment, DomainError, Role, UserView};
use security::AuthContext;
use storage::AssignmentFilter;

use crate::envelope;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub student_ids: Vec<String>,
    #[serde(default)]
    pub driver_id: Option<String>,
    #[serde(default)]
    pub subdriver_id: Option<String>,
    pub date: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AssignRequest {
    /// Exactly one of driver/subdriver must be named.
    fn assignee(&self) -> ApiResult<Assignee> {
        match (&self.driver_id, &self.subdriver_id) {
            (Some(driver), None) => Ok(Assignee::Driver(driver.clone())),
            (None, Some(subdriver)) => Ok(Assignee::Subdriver(subdriver.clone())),
            _ => Err(DomainError::validation(
                "exactly one of driver_id or subdriver_id must be set",
                vec!["driver_id".to_string(), "subdriver_id".to_string()],
            )
            .into()),
        }
    }
}

/// Joins the student and target user onto the link record so list views
/// don't need follow-up requests. Dangling references render as null.
fn hydrate(state: &AppState, assignment: &Assignment) -> Value {
    let student = state
        .storage
        .students
        .get(&assignment.student_id)
        .ok()
        .map(|s| {
            json!({
                "id": s.id,
                "student_no": s.student_no,
                "name": s.full_name(),
                "flight_number": s.flight_number,
                "arrival_time": s.arrival_time,
                "pickup_time": s.pickup_time,
                "school": s.school,
            })
        });
    let assigned_to = assignment.assignee.as_ref().and_then(|a| {
        state
            .storage
            .users
            .get(a.user_id())
            .ok()
            .map(|u| serde_json::to_value(UserView::from(&u)).unwrap_or(Value::Null))
    });
    let mut value = serde_json::to_value(assignment).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.insert("student".to_string(), student.unwrap_or(Value::Null));
        map.insert("assigned_to".to_string(), assigned_to.unwrap_or(Value::Null));
    }
    value
}

pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<AssignRequest>,
) -> ApiResult<Json<Value>> {
    security::require_role(&ctx, &[Role::Admin])?;
    let assignee = request.assignee()?;
    let created = state.storage.assignments.assign(
        &request.student_ids,
        assignee,
        &request.date,
        request.notes.clone(),
    )?;
    Ok(envelope::ok_with("students assigned", created))
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ListQuery {
    pub driver_id: Option<String>,
    pub subdriver_id: Option<String>,
    pub date: Option<String>,
    pub page: usize,
    pub limit: usize,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Value>> {
    security::require_role(&ctx, &[Role::Admin, Role::Greeter, Role::Driver, Role::Subdriver])?;
    let mut filter = AssignmentFilter {
        driver_id: query.driver_id,
        subdriver_id: query.subdriver_id,
        date: query.date,
        assignee_user_id: None,
        page: query.page,
        per_page: query.limit,
    };
    // Drivers and subdrivers only ever see their own assignments.
    if matches!(ctx.role, Role::Driver | Role::Subdriver) {
        filter.assignee_user_id = Some(ctx.user_id.clone());
    }
    let page = state.storage.assignments.list(&filter)?;
    let items: Vec<Value> = page.items.iter().map(|a| hydrate(&state, a)).collect();
    Ok(envelope::ok(json!({
        "items": items,
        "total": page.total,
        "page": page.page,
        "per_page": page.per_page,
        "total_pages": page.total_pages,
    })))
}

#[derive(Debug, Deserialize)]
pub struct UnassignedQuery {
    pub date: String,
}

pub async fn unassigned(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<UnassignedQuery>,
) -> ApiResult<Json<Value>> {
    security::require_role(&ctx, &[Role::Admin])?;
    if query.date.trim().is_empty() {
        return Err(DomainError::invalid_field("date", "date is required").into());
    }
    let pool = state.storage.assignments.unassigned_students(&query.date)?;
    Ok(envelope::ok(pool))
}

/// The assignment-target pool: every driver and subdriver.
pub async fn drivers(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Value>> {
    security::require_role(&ctx, &[Role::Admin])?;
    let pool: Vec<UserView> = state
        .storage
        .users
        .operational()?
        .iter()
        .map(UserView::from)
        .collect();
    Ok(envelope::ok(pool))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    security::require_role(&ctx, &[Role::Admin])?;
    state.storage.assignments.cancel(&id)?;
    Ok(envelope::ok_message("assignment cancelled"))
}
