use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::routing::post;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::require_field;
use crate::error::AppError;
use crate::models::GeoPoint;
use crate::models::service_object::{ObjectKind, ServiceObject};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/service-objects",
        post(create_service_object).get(list_service_objects),
    )
}

#[derive(Deserialize)]
pub struct CreateServiceObjectRequest {
    pub name: String,
    pub kind: ObjectKind,
    pub client_id: Uuid,
    pub address: String,
    pub coordinates: Option<GeoPoint>,
}

#[derive(Deserialize)]
pub struct ListServiceObjectsQuery {
    pub q: Option<String>,
    pub client_id: Option<Uuid>,
}

async fn create_service_object(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateServiceObjectRequest>,
) -> Result<Json<ServiceObject>, AppError> {
    let mut errors = Vec::new();
    require_field(&mut errors, "name", &payload.name);
    require_field(&mut errors, "address", &payload.address);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    if !state.clients.contains_key(&payload.client_id) {
        return Err(AppError::BadRequest(format!(
            "unknown client {}",
            payload.client_id
        )));
    }

    let object = ServiceObject {
        id: Uuid::new_v4(),
        name: payload.name,
        kind: payload.kind,
        client_id: payload.client_id,
        address: payload.address,
        coordinates: payload.coordinates,
        created_at: Utc::now(),
    };

    state.service_objects.insert(object.id, object.clone());
    Ok(Json(object))
}

async fn list_service_objects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListServiceObjectsQuery>,
) -> Json<Vec<ServiceObject>> {
    let objects = state
        .service_objects
        .iter()
        .filter(|entry| {
            let object = entry.value();
            let matches_search = match &query.q {
                Some(q) => object.matches_search(q),
                None => true,
            };
            let matches_client = match query.client_id {
                Some(client_id) => object.client_id == client_id,
                None => true,
            };
            matches_search && matches_client
        })
        .map(|entry| entry.value().clone())
        .collect();

    Json(objects)
}
