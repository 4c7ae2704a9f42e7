//! Bearer token extraction for the inspection and validation endpoints.

use axum::extract::FromRequestParts;
use axum::http::{StatusCode, header, request::Parts};
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// The raw token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively. The token itself is not checked
/// here; handlers pass it to the token authority.
#[derive(Clone, Debug)]
pub struct BearerToken(pub String);

/// 401 response in the inactive-token shape.
pub(crate) fn inactive_token_response(error: &str, error_description: &str) -> Response {
    let body = json!({
        "active": false,
        "error": error,
        "error_description": error_description
    });
    (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                inactive_token_response("invalid_request", "Missing Authorization header")
            })?;

        // Split only on the first space.
        let (scheme, token) = auth_header.split_once(' ').ok_or_else(|| {
            inactive_token_response("invalid_request", "Invalid Authorization header format")
        })?;

        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(inactive_token_response(
                "invalid_request",
                "Authorization scheme must be Bearer",
            ));
        }

        let token = token.trim();
        if token.is_empty() {
            return Err(inactive_token_response(
                "invalid_request",
                "Bearer token is empty",
            ));
        }

        Ok(Self(token.to_string()))
    }
}
