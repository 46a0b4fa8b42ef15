use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{post, put};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::{SearchQuery, require_field};
use crate::error::AppError;
use crate::models::client::{Client, ContractStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/clients", post(create_client).get(list_clients))
        .route("/clients/:id", put(update_client).delete(delete_client))
}

#[derive(Deserialize)]
pub struct ClientPayload {
    pub name: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub contract: Option<ContractStatus>,
}

impl ClientPayload {
    fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        require_field(&mut errors, "name", &self.name);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

async fn create_client(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ClientPayload>,
) -> Result<Json<Client>, AppError> {
    payload.validate()?;

    let client = Client {
        id: Uuid::new_v4(),
        name: payload.name,
        contact_person: payload.contact_person,
        phone: payload.phone,
        email: payload.email,
        contract: payload.contract.unwrap_or(ContractStatus::Active),
        created_at: Utc::now(),
    };

    state.clients.insert(client.id, client.clone());
    Ok(Json(client))
}

async fn list_clients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Client>> {
    let clients = state
        .clients
        .iter()
        .filter(|entry| match &query.q {
            Some(q) => entry.value().matches_search(q),
            None => true,
        })
        .map(|entry| entry.value().clone())
        .collect();

    Json(clients)
}

async fn update_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClientPayload>,
) -> Result<Json<Client>, AppError> {
    payload.validate()?;

    let mut client = state
        .clients
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("client {id} not found")))?;

    client.name = payload.name;
    client.contact_person = payload.contact_person;
    client.phone = payload.phone;
    client.email = payload.email;
    if let Some(contract) = payload.contract {
        client.contract = contract;
    }

    Ok(Json(client.clone()))
}

async fn delete_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .clients
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("client {id} not found")))?;

    Ok(StatusCode::NO_CONTENT)
}
