//! Mapping of registry and token errors onto OAuth error responses.

use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

use crate::errors::{RegistryError, TokenError};

pub(crate) type ErrorResponse = (StatusCode, Json<Value>);

/// Build a `{"error", "error_description"}` body with the given status.
pub(crate) fn oauth_error(status: StatusCode, error: &str, description: &str) -> ErrorResponse {
    (
        status,
        Json(json!({
            "error": error,
            "error_description": description
        })),
    )
}

fn server_error() -> ErrorResponse {
    oauth_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "server_error",
        "Internal server error",
    )
}

/// Status and error code for a failed registration.
pub(crate) fn registry_error_response(e: &RegistryError) -> ErrorResponse {
    match e {
        RegistryError::DuplicateName(_)
        | RegistryError::ApplicationNotFound(_)
        | RegistryError::ClientNotFound(_)
        | RegistryError::InvalidRequest(_) => {
            oauth_error(StatusCode::BAD_REQUEST, "invalid_request", &e.to_string())
        }
        RegistryError::ScopeNotGranted(_) => {
            oauth_error(StatusCode::BAD_REQUEST, "invalid_scope", &e.to_string())
        }
        RegistryError::StorageFailure(_) => {
            tracing::error!(error = ?e, "registration failed");
            server_error()
        }
    }
}

/// Status and error code for a failed lookup by id.
pub(crate) fn lookup_error_response(e: &RegistryError) -> ErrorResponse {
    match e {
        RegistryError::ApplicationNotFound(_) | RegistryError::ClientNotFound(_) => {
            oauth_error(StatusCode::NOT_FOUND, "not_found", &e.to_string())
        }
        _ => registry_error_response(e),
    }
}

/// Status and error code for a failed token request.
pub(crate) fn token_error_response(e: &TokenError) -> ErrorResponse {
    let (status, error_code) = match e {
        TokenError::InvalidClient(_) => (StatusCode::UNAUTHORIZED, "invalid_client"),
        TokenError::ScopeNotGranted(_) => (StatusCode::BAD_REQUEST, "invalid_scope"),
        TokenError::InvalidOrExpired(_) => (StatusCode::BAD_REQUEST, "invalid_grant"),
        TokenError::NotFound(_) => (StatusCode::UNAUTHORIZED, "invalid_token"),
        TokenError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
        TokenError::UnsupportedGrantType(_) => (StatusCode::BAD_REQUEST, "unsupported_grant_type"),
        TokenError::StorageFailure(_) => {
            tracing::error!(error = ?e, "token request failed");
            return server_error();
        }
    };
    oauth_error(status, error_code, &e.to_string())
}
