pub mod applications;
pub mod clients;
pub mod employees;
pub mod service_objects;
pub mod work_orders;
pub mod ws;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;

use crate::error::FieldError;
use crate::models::work_order::WorkOrderStatus;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(clients::router())
        .merge(employees::router())
        .merge(service_objects::router())
        .merge(applications::router())
        .merge(work_orders::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/stats", get(stats))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .fallback_service(ServeDir::new("static"))
}

/// Free-text filter shared by the list endpoints.
#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

pub(crate) fn require_field(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::required(field));
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    clients: usize,
    employees: usize,
    service_objects: usize,
    applications: usize,
    work_orders: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        clients: state.clients.len(),
        employees: state.employees.len(),
        service_objects: state.service_objects.len(),
        applications: state.applications.len(),
        work_orders: state.work_orders.len(),
    })
}

#[derive(Serialize)]
struct StatsResponse {
    active_applications: usize,
    work_orders_in_progress: usize,
    employees_on_shift: usize,
    applications_by_status: BTreeMap<String, usize>,
}

async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let mut applications_by_status = BTreeMap::new();
    let mut active_applications = 0;

    for entry in state.applications.iter() {
        let app = entry.value();
        if app.is_active() {
            active_applications += 1;
        }
        *applications_by_status
            .entry(format!("{:?}", app.status))
            .or_insert(0) += 1;
    }

    let work_orders_in_progress = state
        .work_orders
        .iter()
        .filter(|entry| entry.value().status == WorkOrderStatus::InProgress)
        .count();

    let employees_on_shift = state
        .employees
        .iter()
        .filter(|entry| entry.value().is_available())
        .count();

    Json(StatsResponse {
        active_applications,
        work_orders_in_progress,
        employees_on_shift,
        applications_by_status,
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
