//! Handles GET/POST /token - client credentials and refresh token grants

use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, header},
};
use base64::prelude::*;
use serde::Deserialize;

use super::{
    context::AppState,
    utils_oauth::{ErrorResponse, token_error_response},
};
use crate::errors::TokenError;
use crate::oauth::{GrantType, IssuedToken, ScopeSet, TokenResponse};

/// Token endpoint parameters, from the form body or the query string.
#[derive(Debug, Default, Deserialize)]
pub struct TokenForm {
    pub grant_type: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: Option<String>,
    pub refresh_token: Option<String>,
}

/// Client credentials presented with a token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAuthentication {
    pub client_id: String,
    pub client_secret: Option<String>,
}

/// Extract client authentication from the Authorization header, falling back to form fields.
pub fn extract_client_auth(headers: &HeaderMap, form: &TokenForm) -> Option<ClientAuthentication> {
    let basic = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
        .and_then(|encoded| BASE64_STANDARD.decode(encoded.trim()).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok());

    if let Some((client_id, client_secret)) = basic.as_deref().and_then(|c| c.split_once(':')) {
        return Some(ClientAuthentication {
            client_id: client_id.to_string(),
            client_secret: Some(client_secret.to_string()),
        });
    }

    form.client_id.as_ref().map(|client_id| ClientAuthentication {
        client_id: client_id.clone(),
        client_secret: form.client_secret.clone(),
    })
}

/// Token endpoint. Axum's `Form` reads the query string for GET requests.
pub async fn handle_oauth_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<TokenForm>,
) -> Result<Json<TokenResponse>, ErrorResponse> {
    let client_auth = extract_client_auth(&headers, &form);

    let issued = grant(&state, form, client_auth)
        .await
        .map_err(|e| token_error_response(&e))?;

    Ok(Json(TokenResponse::from_issued(&issued)))
}

async fn grant(
    state: &AppState,
    form: TokenForm,
    client_auth: Option<ClientAuthentication>,
) -> Result<IssuedToken, TokenError> {
    let grant_type = match form.grant_type.as_deref() {
        Some("client_credentials") => GrantType::ClientCredentials,
        Some("refresh_token") => GrantType::RefreshToken,
        Some(other) => return Err(TokenError::UnsupportedGrantType(other.to_string())),
        None => {
            return Err(TokenError::InvalidRequest(
                "grant_type is required".to_string(),
            ));
        }
    };

    match grant_type {
        GrantType::ClientCredentials => {
            let (client_id, client_secret) = match client_auth {
                Some(ClientAuthentication {
                    client_id,
                    client_secret: Some(client_secret),
                }) => (client_id, client_secret),
                _ => {
                    return Err(TokenError::InvalidClient(
                        "client credentials are required".to_string(),
                    ));
                }
            };

            // An empty scope parameter counts as omitted.
            let requested = form
                .scope
                .as_deref()
                .map(ScopeSet::parse)
                .filter(|scopes| !scopes.is_empty());

            state
                .tokens
                .issue_token(&client_id, &client_secret, requested.as_ref())
                .await
        }
        GrantType::RefreshToken => {
            let refresh_token = form
                .refresh_token
                .as_deref()
                .filter(|token| !token.is_empty())
                .ok_or_else(|| {
                    TokenError::InvalidRequest("refresh_token is required".to_string())
                })?;

            match client_auth {
                Some(ClientAuthentication {
                    client_id,
                    client_secret: Some(client_secret),
                }) => {
                    state
                        .tokens
                        .refresh_authenticated(&client_id, &client_secret, refresh_token)
                        .await
                }
                _ => state.tokens.refresh(refresh_token).await,
            }
        }
    }
}
