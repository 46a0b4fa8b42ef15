use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::GeoPoint;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ObjectKind {
    Location,
    Asset,
}

/// A serviced site or piece of equipment belonging to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceObject {
    pub id: Uuid,
    pub name: String,
    pub kind: ObjectKind,
    pub client_id: Uuid,
    pub address: String,
    pub coordinates: Option<GeoPoint>,
    pub created_at: DateTime<Utc>,
}

impl ServiceObject {
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.address.to_lowercase().contains(&query)
    }
}
