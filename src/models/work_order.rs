use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WorkOrderStatus {
    Assigned,
    Accepted,
    EnRoute,
    InProgress,
    Completed,
    Cancelled,
}

/// An application handed to a specific employee with a planned time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: Uuid,
    pub number: String,
    pub application_id: Uuid,
    pub employee_id: Uuid,
    pub status: WorkOrderStatus,
    pub score: u32,
    pub planned_start: DateTime<Utc>,
    pub planned_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
