use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Availability {
    Available,
    Busy,
}

/// Derived ranking entry for one candidate; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeMatch {
    pub employee_id: Uuid,
    pub full_name: String,
    pub score: u32,
    pub distance_km: Option<f64>,
    pub availability: Availability,
    pub reasons: Vec<String>,
}
