//! Handles POST /register/application and GET /applications/{application_id}

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::{
    context::AppState,
    utils_oauth::{ErrorResponse, lookup_error_response, registry_error_response},
};
use crate::oauth::{Application, ScopeSet};

#[derive(Debug, Deserialize)]
pub struct RegisterApplicationRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterApplicationResponse {
    pub application_id: String,
}

pub async fn handle_register_application(
    State(state): State<AppState>,
    Json(request): Json<RegisterApplicationRequest>,
) -> Result<(StatusCode, Json<RegisterApplicationResponse>), ErrorResponse> {
    let scopes: ScopeSet = request.scopes.iter().collect();

    let application_id = state
        .applications
        .register_application(&request.name, scopes)
        .await
        .map_err(|e| registry_error_response(&e))?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterApplicationResponse { application_id }),
    ))
}

pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
) -> Result<Json<Application>, ErrorResponse> {
    state
        .applications
        .get_by_id(&application_id)
        .await
        .map(Json)
        .map_err(|e| lookup_error_response(&e))
}
