//! Storage trait definitions for applications, clients, and tokens.
//!
//! Each resource has its own trait so that a backend can guard every map
//! independently. Inserts never overwrite: a duplicate key is reported as a
//! [`StorageError`] conflict and the existing record is left untouched.

use crate::errors::StorageError;
use crate::oauth::types::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type Result<T> = std::result::Result<T, StorageError>;

/// Trait for storing and retrieving applications
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Store a new application.
    ///
    /// Fails with [`StorageError::NameConflict`] if the name is taken and with
    /// [`StorageError::IdConflict`] if the id is taken.
    async fn insert_application(&self, application: &Application) -> Result<()>;

    /// Retrieve an application by name
    async fn get_application_by_name(&self, name: &str) -> Result<Option<Application>>;

    /// Retrieve an application by id
    async fn get_application_by_id(&self, id: &str) -> Result<Option<Application>>;

    /// List applications ordered by name
    async fn list_applications(&self, limit: Option<usize>) -> Result<Vec<Application>>;
}

/// Trait for storing and retrieving clients
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Store a new client, failing with [`StorageError::IdConflict`] if the id is taken
    async fn insert_client(&self, client: &Client) -> Result<()>;

    /// Retrieve a client by ID
    async fn get_client(&self, client_id: &str) -> Result<Option<Client>>;

    /// List all clients registered for an application
    async fn list_application_clients(&self, application_id: &str) -> Result<Vec<Client>>;
}

/// Trait for storing and retrieving access tokens
#[async_trait]
pub trait AccessTokenStore: Send + Sync {
    /// Store a new access token, failing with [`StorageError::IdConflict`] if the token exists
    async fn insert_token(&self, token: &AccessToken) -> Result<()>;

    /// Retrieve an access token regardless of expiry
    async fn get_token(&self, token: &str) -> Result<Option<AccessToken>>;

    /// Remove an access token, returning it if it was present
    async fn remove_token(&self, token: &str) -> Result<Option<AccessToken>>;

    /// Remove tokens that expired before `now`
    async fn cleanup_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize>;
}

/// Trait for storing and retrieving refresh tokens
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Store a new refresh token, failing with [`StorageError::IdConflict`] if the token exists
    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<()>;

    /// Retrieve a refresh token without consuming it
    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>>;

    /// Remove and return a refresh token. At most one caller observes `Some`.
    async fn consume_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>>;

    /// Remove refresh tokens that expired before `now`
    async fn cleanup_expired_refresh_tokens(&self, now: DateTime<Utc>) -> Result<usize>;
}

/// Umbrella trait for a backend providing every store
pub trait AuthStorage:
    ApplicationStore + ClientStore + AccessTokenStore + RefreshTokenStore + Send + Sync
{
}

impl<T> AuthStorage for T where
    T: ApplicationStore + ClientStore + AccessTokenStore + RefreshTokenStore + Send + Sync
{
}
