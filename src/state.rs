use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::models::application::Application;
use crate::models::client::Client;
use crate::models::employee::Employee;
use crate::models::service_object::ServiceObject;
use crate::models::work_order::WorkOrder;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub clients: DashMap<Uuid, Client>,
    pub employees: DashMap<Uuid, Employee>,
    pub service_objects: DashMap<Uuid, ServiceObject>,
    pub applications: DashMap<Uuid, Application>,
    pub work_orders: DashMap<Uuid, WorkOrder>,
    // The planner re-reads the application from the map, so the queue
    // carries ids rather than snapshots.
    pub planning_tx: mpsc::Sender<Uuid>,
    pub work_order_events_tx: broadcast::Sender<WorkOrder>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        planning_queue_size: usize,
        event_buffer_size: usize,
    ) -> (Self, mpsc::Receiver<Uuid>) {
        let (planning_tx, planning_rx) = mpsc::channel(planning_queue_size);
        let (work_order_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        (
            Self {
                clients: DashMap::new(),
                employees: DashMap::new(),
                service_objects: DashMap::new(),
                applications: DashMap::new(),
                work_orders: DashMap::new(),
                planning_tx,
                work_order_events_tx,
                metrics: Metrics::new(),
            },
            planning_rx,
        )
    }
}
