//! Handles POST /register/client and GET /clients/{client_id}

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    context::AppState,
    utils_oauth::{ErrorResponse, lookup_error_response, registry_error_response},
};
use crate::errors::RegistryError;
use crate::oauth::{Client, ScopeSet};

#[derive(Debug, Deserialize)]
pub struct RegisterClientRequest {
    #[serde(default)]
    pub application_name: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// The only response that ever carries a client secret.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterClientResponse {
    pub client_id: String,
    pub client_secret: String,
}

/// Public view of a registered client.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClientView {
    pub client_id: String,
    pub application_id: String,
    pub application_name: String,
    pub scopes: ScopeSet,
    pub domain: String,
    pub created_at: DateTime<Utc>,
}

impl From<Client> for ClientView {
    fn from(client: Client) -> Self {
        Self {
            client_id: client.id,
            application_id: client.application_id,
            application_name: client.application_name,
            scopes: client.granted_scopes,
            domain: client.domain,
            created_at: client.created_at,
        }
    }
}

pub async fn handle_register_client(
    State(state): State<AppState>,
    Json(request): Json<RegisterClientRequest>,
) -> Result<(StatusCode, Json<RegisterClientResponse>), ErrorResponse> {
    if request.application_name.trim().is_empty() {
        return Err(registry_error_response(&RegistryError::InvalidRequest(
            "application_name is required".to_string(),
        )));
    }

    let application = state
        .applications
        .get_by_name(&request.application_name)
        .await
        .map_err(|e| registry_error_response(&e))?;

    let scopes: ScopeSet = request.scopes.iter().collect();
    let registered = state
        .clients
        .register_client(&application, scopes)
        .await
        .map_err(|e| registry_error_response(&e))?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterClientResponse {
            client_id: registered.client.id,
            client_secret: registered.client_secret,
        }),
    ))
}

pub async fn handle_get_client(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Result<Json<ClientView>, ErrorResponse> {
    state
        .clients
        .get_by_id(&client_id)
        .await
        .map(|client| Json(ClientView::from(client)))
        .map_err(|e| lookup_error_response(&e))
}
