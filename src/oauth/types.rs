//! Core types for applications, clients, and tokens.

use base64::prelude::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::credentials::secret_digest;
use super::scope::ScopeSet;

/// OAuth 2.1 Grant Types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    ClientCredentials,
    RefreshToken,
}

/// OAuth 2.1 Token Types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    Bearer,
}

/// A tenant owning the maximal scope set its clients may hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Unique application identifier
    pub id: String,
    /// Unique application name
    pub name: String,
    /// Scopes any client of this application may be granted
    pub scopes: ScopeSet,
    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

/// Capability contract for anything that can act as an OAuth client.
pub trait ClientInfo {
    fn client_id(&self) -> &str;

    /// Hex-encoded SHA-256 digest of the client secret.
    fn secret_digest(&self) -> &str;

    fn domain(&self) -> &str;
}

/// A credentialed actor scoped to a subset of its application's scopes.
///
/// Only a digest of the secret is kept; the plaintext is handed out once, in
/// [`RegisteredClient`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Unique client identifier
    pub id: String,
    /// SHA-256 digest of the client secret
    pub secret_digest: String,
    /// Owning application id
    pub application_id: String,
    /// Owning application name
    pub application_name: String,
    /// Scopes this client may request tokens for
    pub granted_scopes: ScopeSet,
    /// Registered client domain
    pub domain: String,
    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("secret_digest", &"<redacted>")
            .field("application_id", &self.application_id)
            .field("application_name", &self.application_name)
            .field("granted_scopes", &self.granted_scopes)
            .field("domain", &self.domain)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl ClientInfo for Client {
    fn client_id(&self) -> &str {
        &self.id
    }

    fn secret_digest(&self) -> &str {
        &self.secret_digest
    }

    fn domain(&self) -> &str {
        &self.domain
    }
}

/// A freshly registered client together with its plaintext secret.
#[derive(Clone)]
pub struct RegisteredClient {
    pub client: Client,
    pub client_secret: String,
}

impl fmt::Debug for RegisteredClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredClient")
            .field("client", &self.client)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// OAuth Access Token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// The access token
    pub token: String,
    /// Token type
    pub token_type: TokenType,
    /// Client ID
    pub client_id: String,
    /// Granted scopes
    pub scopes: ScopeSet,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Active while `now <= expires_at`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}

/// OAuth Refresh Token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    /// The refresh token
    pub token: String,
    /// Access token issued alongside this refresh token
    pub access_token: String,
    /// Client ID
    pub client_id: String,
    /// Granted scopes
    pub scopes: ScopeSet,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}

/// The result of a successful grant.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: AccessToken,
    pub refresh_token: Option<RefreshToken>,
}

/// Read-only view of an active access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub active: bool,
    pub client_id: String,
    pub scopes: ScopeSet,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<&AccessToken> for TokenInfo {
    fn from(token: &AccessToken) -> Self {
        Self {
            active: true,
            client_id: token.client_id.clone(),
            scopes: token.scopes.clone(),
            issued_at: token.created_at,
            expires_at: token.expires_at,
        }
    }
}

/// Token Response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token
    pub access_token: String,
    /// Token type
    pub token_type: TokenType,
    /// Expires in seconds
    pub expires_in: u64,
    /// Refresh token (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Granted scope
    pub scope: String,
}

impl TokenResponse {
    /// Build the wire response for a freshly issued grant.
    pub fn from_issued(issued: &IssuedToken) -> Self {
        let access_token = &issued.access_token;
        let expires_in = (access_token.expires_at - access_token.created_at)
            .num_seconds()
            .max(0) as u64;
        Self {
            access_token: access_token.token.clone(),
            token_type: access_token.token_type.clone(),
            expires_in,
            refresh_token: issued.refresh_token.as_ref().map(|rt| rt.token.clone()),
            scope: access_token.scopes.to_scope_string(),
        }
    }
}

/// Generate a secure random token
pub fn generate_token() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.r#gen();
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate an application ID
pub fn generate_application_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Check a presented secret against a client's stored digest.
///
/// The digests are compared without early exit so that the time taken does
/// not depend on how many leading bytes match.
pub fn verify_client_secret<C: ClientInfo + ?Sized>(client: &C, presented_secret: &str) -> bool {
    let presented = secret_digest(presented_secret);
    let expected = client.secret_digest().as_bytes();
    let presented = presented.as_bytes();

    if expected.len() != presented.len() {
        return false;
    }

    expected
        .iter()
        .zip(presented)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn client_with_secret(secret: &str) -> Client {
        Client {
            id: "client_a_b_c".to_string(),
            secret_digest: secret_digest(secret),
            application_id: "app-id".to_string(),
            application_name: "billing".to_string(),
            granted_scopes: ScopeSet::parse("read"),
            domain: "http://localhost:9094".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_verify_client_secret() {
        let client = client_with_secret("secret_x_y_z");
        assert!(verify_client_secret(&client, "secret_x_y_z"));
        assert!(!verify_client_secret(&client, "secret_x_y_"));
        assert!(!verify_client_secret(&client, ""));
    }

    #[test]
    fn test_client_debug_redacts_secret() {
        let client = client_with_secret("secret_x_y_z");
        let rendered = format!("{:?}", client);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(&client.secret_digest));

        let registered = RegisteredClient {
            client,
            client_secret: "secret_x_y_z".to_string(),
        };
        assert!(!format!("{:?}", registered).contains("secret_x_y_z"));
    }

    #[test]
    fn test_access_token_activity_boundary() {
        let now = Utc::now();
        let token = AccessToken {
            token: generate_token(),
            token_type: TokenType::Bearer,
            client_id: "client".to_string(),
            scopes: ScopeSet::parse("read"),
            created_at: now,
            expires_at: now + Duration::hours(1),
        };

        assert!(token.is_active_at(now));
        assert!(token.is_active_at(token.expires_at));
        assert!(!token.is_active_at(token.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn test_token_response_shape() {
        let now = Utc::now();
        let issued = IssuedToken {
            access_token: AccessToken {
                token: "at".to_string(),
                token_type: TokenType::Bearer,
                client_id: "client".to_string(),
                scopes: ScopeSet::parse("write read"),
                created_at: now,
                expires_at: now + Duration::seconds(3600),
            },
            refresh_token: None,
        };

        let response = TokenResponse::from_issued(&issued);
        assert_eq!(response.expires_in, 3600);
        assert_eq!(response.scope, "read write");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token_type"], "Bearer");
        assert!(json.get("refresh_token").is_none());
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
    }
}
