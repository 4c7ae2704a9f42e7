//! Handles GET/POST /inspect and /validate - bearer token introspection

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::{
    context::AppState,
    middleware_auth::{BearerToken, inactive_token_response},
    utils_oauth::token_error_response,
};
use crate::errors::TokenError;
use crate::oauth::TokenInfo;

/// Introspection body for an active token.
#[derive(Debug, Serialize)]
pub struct InspectResponse {
    pub active: bool,
    pub client_id: String,
    /// Space-delimited granted scopes
    pub scope: String,
    /// Issued-at, seconds since the epoch
    pub iat: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

impl From<TokenInfo> for InspectResponse {
    fn from(info: TokenInfo) -> Self {
        Self {
            active: info.active,
            client_id: info.client_id,
            scope: info.scopes.to_scope_string(),
            iat: info.issued_at.timestamp(),
            exp: info.expires_at.timestamp(),
        }
    }
}

pub async fn handle_inspect(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Response {
    match state.tokens.inspect(&token).await {
        Ok(info) => Json(InspectResponse::from(info)).into_response(),
        Err(TokenError::NotFound(description)) => {
            inactive_token_response("invalid_token", &description)
        }
        Err(e) => token_error_response(&e).into_response(),
    }
}

/// Reports only whether the token is active: 204 or a bare 401.
pub async fn handle_validate(
    State(state): State<AppState>,
    bearer: Result<BearerToken, Response>,
) -> Response {
    let Ok(BearerToken(token)) = bearer else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    match state.tokens.validate(&token).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(TokenError::InvalidOrExpired(_)) => StatusCode::UNAUTHORIZED.into_response(),
        Err(e) => token_error_response(&e).into_response(),
    }
}
