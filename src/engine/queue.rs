use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub async fn enqueue_application(state: &AppState, application_id: Uuid) -> Result<(), AppError> {
    state
        .planning_tx
        .send(application_id)
        .await
        .map_err(|err| AppError::Internal(format!("planning queue send failed: {err}")))?;

    state.metrics.applications_in_queue.inc();
    Ok(())
}
