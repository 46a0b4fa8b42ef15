use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ordered: Low < Medium < High < Urgent < Emergency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
    Emergency,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApplicationStatus {
    New,
    InProgress,
    Completed,
    Cancelled,
    Suspended,
}

/// A logged service request from a client awaiting dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub number: String,
    pub client_id: Uuid,
    pub object_id: Uuid,
    pub service_type: String,
    pub territory: String,
    pub status: ApplicationStatus,
    pub priority: Priority,
    pub is_emergency: bool,
    pub description: String,
    pub sla_deadline: DateTime<Utc>,
    pub assigned_employee: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Application {
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.number.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }

    pub fn is_active(&self) -> bool {
        !matches!(
            self.status,
            ApplicationStatus::Completed | ApplicationStatus::Cancelled
        )
    }
}
