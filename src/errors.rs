//! Standardized error types following the `error-appauth-<domain>-<number>` format.

use thiserror::Error;

/// Configuration errors that occur during application startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error when a required environment variable is not set
    #[error("error-appauth-config-1 {0} must be set")]
    EnvVarRequired(String),

    /// Error when HTTP_PORT cannot be parsed
    #[error("error-appauth-config-2 Parsing HTTP_PORT into u16 failed: {0:?}")]
    PortParsingFailed(std::num::ParseIntError),

    /// Error when version information is not available
    #[error("error-appauth-config-3 One of GIT_HASH or CARGO_PKG_VERSION must be set")]
    VersionNotSet,

    /// Error when duration string cannot be parsed
    #[error("error-appauth-config-4 Failed to parse duration '{0}': {1}")]
    DurationParsingFailed(String, String),

    /// Error when boolean string cannot be parsed
    #[error(
        "error-appauth-config-5 Failed to parse boolean '{0}': expected true/false/1/0/yes/no/on/off"
    )]
    BoolParsingFailed(String),

    /// Error when the refresh token lifetime does not outlive the access token lifetime
    #[error(
        "error-appauth-config-6 REFRESH_TOKEN_TTL ({refresh}s) must be longer than ACCESS_TOKEN_TTL ({access}s)"
    )]
    TokenLifetimeOrdering { access: i64, refresh: i64 },

    /// Error when a duration is zero or negative
    #[error("error-appauth-config-7 {0} must be a positive duration")]
    NonPositiveDuration(String),
}

/// Application and client registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An application with the same name is already registered
    #[error("error-appauth-registry-1 Application name already registered: {0}")]
    DuplicateName(String),

    /// No application matches the given name or id
    #[error("error-appauth-registry-2 Application not found: {0}")]
    ApplicationNotFound(String),

    /// No client matches the given id
    #[error("error-appauth-registry-3 Client not found: {0}")]
    ClientNotFound(String),

    /// Requested scopes are not part of the application's scopes
    #[error("error-appauth-registry-4 Scope not granted: {0}")]
    ScopeNotGranted(String),

    /// Registration request is malformed
    #[error("error-appauth-registry-5 Invalid request: {0}")]
    InvalidRequest(String),

    /// Backing store rejected the write
    #[error("error-appauth-registry-6 Storage failure: {0}")]
    StorageFailure(String),
}

/// Token grant, inspection and validation errors
#[derive(Debug, Error)]
pub enum TokenError {
    /// Client is unknown or presented the wrong secret
    #[error("error-appauth-token-1 Invalid client credentials: {0}")]
    InvalidClient(String),

    /// Requested scopes are not part of the client's granted scopes
    #[error("error-appauth-token-2 Scope not granted: {0}")]
    ScopeNotGranted(String),

    /// Token is unknown or past its expiry
    #[error("error-appauth-token-3 Invalid or expired token: {0}")]
    InvalidOrExpired(String),

    /// Token is not active
    #[error("error-appauth-token-4 Token not found: {0}")]
    NotFound(String),

    /// Token request is malformed
    #[error("error-appauth-token-5 Invalid request: {0}")]
    InvalidRequest(String),

    /// Grant type is not supported
    #[error("error-appauth-token-6 Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    /// Backing store rejected the read or write
    #[error("error-appauth-token-7 Storage failure: {0}")]
    StorageFailure(String),
}

/// In-memory storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// A record with the same unique name already exists
    #[error("error-appauth-storage-1 Name already exists: {0}")]
    NameConflict(String),

    /// A record with the same identifier already exists
    #[error("error-appauth-storage-2 Identifier already exists: {0}")]
    IdConflict(String),

    /// A storage lock was poisoned by a panicking writer
    #[error("error-appauth-storage-3 Lock error: {0}")]
    LockPoisoned(String),
}
