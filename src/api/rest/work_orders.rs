use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, patch};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::application::ApplicationStatus;
use crate::models::work_order::{WorkOrder, WorkOrderStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/work-orders", get(list_work_orders))
        .route("/work-orders/:id/status", patch(update_work_order_status))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: WorkOrderStatus,
}

async fn list_work_orders(State(state): State<Arc<AppState>>) -> Json<Vec<WorkOrder>> {
    let work_orders = state
        .work_orders
        .iter()
        .map(|entry| entry.value().clone())
        .collect();

    Json(work_orders)
}

async fn update_work_order_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<WorkOrder>, AppError> {
    let work_order = {
        let mut work_order = state
            .work_orders
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("work order {id} not found")))?;

        work_order.status = payload.status;
        work_order.clone()
    };

    // Completion and cancellation flow back to the application.
    if let Some(mut application) = state.applications.get_mut(&work_order.application_id) {
        match work_order.status {
            WorkOrderStatus::Completed => {
                application.status = ApplicationStatus::Completed;
            }
            WorkOrderStatus::Cancelled => {
                application.status = ApplicationStatus::New;
                application.assigned_employee = None;
            }
            _ => {}
        }
    }

    Ok(Json(work_order))
}
