pub mod application;
pub mod client;
pub mod employee;
pub mod matching;
pub mod service_object;
pub mod work_order;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}
