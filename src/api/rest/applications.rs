use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::rest::require_field;
use crate::engine::queue::enqueue_application;
use crate::engine::scoring::{rank_candidates, score_candidate};
use crate::error::AppError;
use crate::models::application::{Application, ApplicationStatus, Priority};
use crate::models::employee::Employee;
use crate::models::matching::EmployeeMatch;
use crate::models::work_order::WorkOrder;
use crate::sla::{SlaCountdown, countdown};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/applications", post(create_application).get(list_applications))
        .route(
            "/applications/:id",
            get(get_application).delete(delete_application),
        )
        .route("/applications/:id/candidates", get(list_candidates))
        .route("/applications/:id/assign", post(assign_employee))
}

#[derive(Deserialize)]
pub struct CreateApplicationRequest {
    pub number: String,
    pub client_id: Uuid,
    pub object_id: Uuid,
    pub service_type: String,
    pub territory: String,
    pub priority: Priority,
    #[serde(default)]
    pub is_emergency: bool,
    pub description: String,
    pub sla_deadline: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct ListApplicationsQuery {
    pub q: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub priority: Option<Priority>,
}

/// List row: the application plus its derived SLA countdown.
#[derive(Serialize)]
pub struct ApplicationRow {
    #[serde(flatten)]
    pub application: Application,
    pub sla: SlaCountdown,
}

#[derive(Deserialize)]
pub struct AssignRequest {
    pub employee_id: Uuid,
}

async fn create_application(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateApplicationRequest>,
) -> Result<Json<Application>, AppError> {
    let mut errors = Vec::new();
    require_field(&mut errors, "number", &payload.number);
    require_field(&mut errors, "service_type", &payload.service_type);
    require_field(&mut errors, "territory", &payload.territory);
    require_field(&mut errors, "description", &payload.description);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    if !state.clients.contains_key(&payload.client_id) {
        return Err(AppError::BadRequest(format!(
            "unknown client {}",
            payload.client_id
        )));
    }
    if !state.service_objects.contains_key(&payload.object_id) {
        return Err(AppError::BadRequest(format!(
            "unknown service object {}",
            payload.object_id
        )));
    }

    let application = Application {
        id: Uuid::new_v4(),
        number: payload.number,
        client_id: payload.client_id,
        object_id: payload.object_id,
        service_type: payload.service_type,
        territory: payload.territory,
        status: ApplicationStatus::New,
        priority: payload.priority,
        is_emergency: payload.is_emergency,
        description: payload.description,
        sla_deadline: payload.sla_deadline,
        assigned_employee: None,
        created_at: Utc::now(),
    };

    state.applications.insert(application.id, application.clone());
    enqueue_application(&state, application.id).await?;

    Ok(Json(application))
}

async fn list_applications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListApplicationsQuery>,
) -> Json<Vec<ApplicationRow>> {
    let now = Utc::now();

    let rows = state
        .applications
        .iter()
        .filter(|entry| {
            let app = entry.value();
            let matches_search = match &query.q {
                Some(q) => app.matches_search(q),
                None => true,
            };
            let matches_status = match query.status {
                Some(status) => app.status == status,
                None => true,
            };
            let matches_priority = match query.priority {
                Some(priority) => app.priority == priority,
                None => true,
            };
            matches_search && matches_status && matches_priority
        })
        .map(|entry| {
            let application = entry.value().clone();
            let sla = countdown(application.sla_deadline, now);
            ApplicationRow { application, sla }
        })
        .collect();

    Json(rows)
}

async fn get_application(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, AppError> {
    let application = state
        .applications
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("application {id} not found")))?;

    Ok(Json(application.value().clone()))
}

async fn delete_application(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .applications
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("application {id} not found")))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Ranks the whole roster against one application. Unavailable employees are
/// included so the dispatcher sees the full picture.
async fn list_candidates(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<EmployeeMatch>>, AppError> {
    let application = state
        .applications
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("application {id} not found")))?;

    let site = state
        .service_objects
        .get(&application.object_id)
        .and_then(|entry| entry.value().coordinates.clone());

    // DashMap iteration order is arbitrary; fix the roster order so tied
    // scores come back in a stable order.
    let mut roster: Vec<Employee> = state
        .employees
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    roster.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));

    Ok(Json(rank_candidates(&application, site.as_ref(), &roster)))
}

async fn assign_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> Result<Json<WorkOrder>, AppError> {
    let application = state
        .applications
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("application {id} not found")))?;

    if application.assigned_employee.is_some() {
        return Err(AppError::Conflict(format!(
            "application {id} is already assigned"
        )));
    }

    let employee = state
        .employees
        .get(&payload.employee_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("employee {} not found", payload.employee_id)))?;

    if !employee.is_available() {
        return Err(AppError::Conflict(format!(
            "employee {} is not available",
            employee.id
        )));
    }

    let site = state
        .service_objects
        .get(&application.object_id)
        .and_then(|entry| entry.value().coordinates.clone());

    let matched = score_candidate(&application, site.as_ref(), &employee);
    let work_order =
        crate::engine::planner::dispatch(&state, &application, employee.id, matched.score)?;

    Ok(Json(work_order))
}
