use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::engine::queue::enqueue_application;
use crate::engine::scoring::rank_candidates;
use crate::error::AppError;
use crate::models::application::{Application, ApplicationStatus};
use crate::models::employee::Employee;
use crate::models::work_order::{WorkOrder, WorkOrderStatus};
use crate::state::AppState;

const DEFAULT_WORK_WINDOW_HOURS: i64 = 2;
const RETRY_DELAY_MS: u64 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlanOutcome {
    Dispatched,
    Requeued,
    Skipped,
}

/// Greedy auto-planner: drains the queue of new applications and hands each
/// one to the best-scoring available employee as a work-order draft.
pub async fn run_planner(state: Arc<AppState>, mut planning_rx: mpsc::Receiver<Uuid>) {
    info!("planning engine started");

    while let Some(application_id) = planning_rx.recv().await {
        state.metrics.applications_in_queue.dec();

        let start = Instant::now();
        match plan_application(state.clone(), application_id).await {
            Ok(outcome) => {
                let elapsed = start.elapsed().as_secs_f64();
                state
                    .metrics
                    .planning_latency_seconds
                    .with_label_values(&["success"])
                    .observe(elapsed);
                // Re-queues and skips create no work order and must not
                // count as one.
                if outcome == PlanOutcome::Dispatched {
                    state
                        .metrics
                        .work_orders_total
                        .with_label_values(&["success"])
                        .inc();
                }
            }
            Err(err) => {
                let elapsed = start.elapsed().as_secs_f64();
                state
                    .metrics
                    .planning_latency_seconds
                    .with_label_values(&["error"])
                    .observe(elapsed);
                state
                    .metrics
                    .work_orders_total
                    .with_label_values(&["error"])
                    .inc();
                error!(error = %err, "failed to plan application");
            }
        }
    }

    warn!("planning engine stopped: queue channel closed");
}

async fn plan_application(
    state: Arc<AppState>,
    application_id: Uuid,
) -> Result<PlanOutcome, AppError> {
    let Some(application) = state
        .applications
        .get(&application_id)
        .map(|entry| entry.value().clone())
    else {
        // Deleted while queued.
        return Ok(PlanOutcome::Skipped);
    };

    if application.status != ApplicationStatus::New || application.assigned_employee.is_some() {
        return Ok(PlanOutcome::Skipped);
    }

    let roster: Vec<Employee> = state
        .employees
        .iter()
        .filter_map(|entry| {
            let employee = entry.value();
            if employee.is_available() {
                Some(employee.clone())
            } else {
                None
            }
        })
        .collect();

    if roster.is_empty() {
        warn!(application_id = %application.id, "no available employees; re-queueing application");
        sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
        enqueue_application(&state, application_id).await?;
        return Ok(PlanOutcome::Requeued);
    }

    let site = state
        .service_objects
        .get(&application.object_id)
        .and_then(|entry| entry.value().coordinates.clone());

    let ranked = rank_candidates(&application, site.as_ref(), &roster);
    let best = ranked
        .first()
        .ok_or_else(|| AppError::Internal("failed to rank employees".to_string()))?;

    let work_order = dispatch(&state, &application, best.employee_id, best.score)?;

    info!(
        application_id = %application.id,
        employee_id = %work_order.employee_id,
        score = work_order.score,
        "work order created"
    );

    Ok(PlanOutcome::Dispatched)
}

/// Creates the work-order draft and marks the application assigned. Shared by
/// the planner and the manual-assignment endpoint.
pub fn dispatch(
    state: &AppState,
    application: &Application,
    employee_id: Uuid,
    score: u32,
) -> Result<WorkOrder, AppError> {
    let now = Utc::now();
    let id = Uuid::new_v4();

    let work_order = WorkOrder {
        id,
        number: format!("WO-{}", &id.simple().to_string()[..8]),
        application_id: application.id,
        employee_id,
        status: WorkOrderStatus::Assigned,
        score,
        planned_start: now,
        planned_end: now + ChronoDuration::hours(DEFAULT_WORK_WINDOW_HOURS),
        created_at: now,
    };

    {
        let mut app = state.applications.get_mut(&application.id).ok_or_else(|| {
            AppError::NotFound(format!("application {} not found", application.id))
        })?;
        // Callers check a snapshot; re-check under the map lock so two
        // racing dispatches cannot both win.
        if app.status != ApplicationStatus::New || app.assigned_employee.is_some() {
            return Err(AppError::Conflict(format!(
                "application {} is already assigned",
                application.id
            )));
        }
        app.assigned_employee = Some(employee_id);
        app.status = ApplicationStatus::InProgress;
    }

    state.work_orders.insert(work_order.id, work_order.clone());
    state.metrics.match_score.observe(score as f64);
    let _ = state.work_order_events_tx.send(work_order.clone());

    Ok(work_order)
}
