use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::GeoPoint;

/// Ordered: Specialist outranks Generalist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum SkillLevel {
    Generalist,
    Specialist,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EmployeeStatus {
    OnShift,
    OnBreak,
    Lunch,
    OffShift,
    SickLeave,
    Vacation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub full_name: String,
    pub position: String,
    pub service_types: Vec<String>,
    pub territories: Vec<String>,
    pub skill_level: SkillLevel,
    pub status: EmployeeStatus,
    pub location: Option<GeoPoint>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    /// Only an employee currently on shift can take new work.
    pub fn is_available(&self) -> bool {
        self.status == EmployeeStatus::OnShift
    }

    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.full_name.to_lowercase().contains(&query)
            || self.position.to_lowercase().contains(&query)
    }
}
