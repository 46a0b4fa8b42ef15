use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{patch, post};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::require_field;
use crate::error::{AppError, FieldError};
use crate::models::GeoPoint;
use crate::models::employee::{Employee, EmployeeStatus, SkillLevel};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/employees", post(create_employee).get(list_employees))
        .route("/employees/:id/status", patch(update_employee_status))
        .route("/employees/:id/location", patch(update_employee_location))
}

#[derive(Deserialize)]
pub struct CreateEmployeeRequest {
    pub full_name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub service_types: Vec<String>,
    #[serde(default)]
    pub territories: Vec<String>,
    pub skill_level: SkillLevel,
    pub status: Option<EmployeeStatus>,
    pub location: Option<GeoPoint>,
}

#[derive(Deserialize)]
pub struct ListEmployeesQuery {
    pub q: Option<String>,
    pub available: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: EmployeeStatus,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoPoint,
}

async fn create_employee(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateEmployeeRequest>,
) -> Result<Json<Employee>, AppError> {
    let mut errors = Vec::new();
    require_field(&mut errors, "full_name", &payload.full_name);
    if payload.service_types.iter().all(|t| t.trim().is_empty()) {
        errors.push(FieldError {
            field: "service_types".to_string(),
            message: "at least one service type is required".to_string(),
        });
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let employee = Employee {
        id: Uuid::new_v4(),
        full_name: payload.full_name,
        position: payload.position,
        service_types: payload.service_types,
        territories: payload.territories,
        skill_level: payload.skill_level,
        status: payload.status.unwrap_or(EmployeeStatus::OnShift),
        location: payload.location,
        updated_at: Utc::now(),
    };

    state.employees.insert(employee.id, employee.clone());
    Ok(Json(employee))
}

async fn list_employees(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListEmployeesQuery>,
) -> Json<Vec<Employee>> {
    let employees = state
        .employees
        .iter()
        .filter(|entry| {
            let employee = entry.value();
            let matches_search = match &query.q {
                Some(q) => employee.matches_search(q),
                None => true,
            };
            let matches_availability = match query.available {
                Some(wanted) => employee.is_available() == wanted,
                None => true,
            };
            matches_search && matches_availability
        })
        .map(|entry| entry.value().clone())
        .collect();

    Json(employees)
}

async fn update_employee_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Employee>, AppError> {
    let mut employee = state
        .employees
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("employee {id} not found")))?;

    employee.status = payload.status;
    employee.updated_at = Utc::now();

    Ok(Json(employee.clone()))
}

async fn update_employee_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Employee>, AppError> {
    let mut employee = state
        .employees
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("employee {id} not found")))?;

    employee.location = Some(payload.location);
    employee.updated_at = Utc::now();

    Ok(Json(employee.clone()))
}
