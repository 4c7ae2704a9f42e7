//! Token issuance, inspection, validation and refresh.
//!
//! Expiry is evaluated lazily against the injected [`Clock`] whenever a token
//! is looked up. [`TokenAuthority::sweep_expired`] only reclaims memory.

use chrono::Duration;
use std::sync::Arc;

use super::clients::ClientRegistry;
use super::clock::Clock;
use super::scope::ScopeSet;
use super::types::{
    AccessToken, Client, IssuedToken, RefreshToken, TokenInfo, TokenType, generate_token,
    verify_client_secret,
};
use crate::errors::{RegistryError, StorageError, TokenError};
use crate::storage::traits::AuthStorage;

/// Attempts at storing a freshly generated token string before giving up.
const MAX_TOKEN_ATTEMPTS: usize = 3;

const INVALID_CLIENT_MESSAGE: &str = "client authentication failed";

/// Token lifetimes.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    /// Lifetime of access tokens
    pub access_token_ttl: Duration,
    /// Lifetime of refresh tokens, `None` when grants carry no refresh token
    pub refresh_token_ttl: Option<Duration>,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            access_token_ttl: Duration::seconds(3600),
            refresh_token_ttl: Some(Duration::hours(72)),
        }
    }
}

/// Issues and checks bearer tokens for registered clients.
pub struct TokenAuthority {
    storage: Arc<dyn AuthStorage>,
    clients: Arc<ClientRegistry>,
    clock: Arc<dyn Clock>,
    settings: TokenSettings,
}

impl TokenAuthority {
    pub fn new(
        storage: Arc<dyn AuthStorage>,
        clients: Arc<ClientRegistry>,
        clock: Arc<dyn Clock>,
        settings: TokenSettings,
    ) -> Self {
        Self {
            storage,
            clients,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    /// Client credentials grant.
    ///
    /// `requested_scopes` of `None` requests every scope granted to the client.
    pub async fn issue_token(
        &self,
        client_id: &str,
        client_secret: &str,
        requested_scopes: Option<&ScopeSet>,
    ) -> Result<IssuedToken, TokenError> {
        let client = self.authenticate(client_id, client_secret).await?;

        let scopes = match requested_scopes {
            Some(requested) if !requested.is_subset_of(&client.granted_scopes) => {
                let missing = requested.missing_from(&client.granted_scopes);
                tracing::debug!(
                    client_id = %client.id,
                    missing = ?missing,
                    "requested scopes exceed client scopes"
                );
                return Err(TokenError::ScopeNotGranted(format!(
                    "client does not hold: {}",
                    missing.join(" ")
                )));
            }
            Some(requested) => requested.clone(),
            None => client.granted_scopes.clone(),
        };

        let issued = self.grant(&client.id, scopes).await?;
        tracing::info!(
            client_id = %client.id,
            scopes = %issued.access_token.scopes,
            refresh = issued.refresh_token.is_some(),
            "issued access token"
        );
        Ok(issued)
    }

    /// Describe an active access token.
    pub async fn inspect(&self, access_token: &str) -> Result<TokenInfo, TokenError> {
        let now = self.clock.now();
        match self.lookup(access_token).await? {
            Some(token) if token.is_active_at(now) => Ok(TokenInfo::from(&token)),
            Some(token) => {
                tracing::debug!(client_id = %token.client_id, "inspected expired token");
                Err(TokenError::NotFound("token is not active".to_string()))
            }
            None => Err(TokenError::NotFound("token is not active".to_string())),
        }
    }

    /// Succeeds iff the token exists and has not expired.
    pub async fn validate(&self, access_token: &str) -> Result<(), TokenError> {
        let now = self.clock.now();
        match self.lookup(access_token).await? {
            Some(token) if token.is_active_at(now) => Ok(()),
            _ => Err(TokenError::InvalidOrExpired(
                "access token is invalid or expired".to_string(),
            )),
        }
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// The refresh token is consumed whatever the outcome, so it can be
    /// exchanged at most once.
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedToken, TokenError> {
        let consumed = self
            .storage
            .consume_refresh_token(refresh_token)
            .await
            .map_err(storage_failure)?;
        self.exchange(consumed).await
    }

    /// Like [`TokenAuthority::refresh`], but the caller must authenticate as the
    /// client the refresh token was issued to.
    ///
    /// A refresh token presented by another client is left in place.
    pub async fn refresh_authenticated(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<IssuedToken, TokenError> {
        let client = self.authenticate(client_id, client_secret).await?;

        let owner = self
            .storage
            .get_refresh_token(refresh_token)
            .await
            .map_err(storage_failure)?
            .map(|token| token.client_id);
        if owner.as_deref() != Some(client.id.as_str()) {
            tracing::warn!(client_id = %client.id, "refresh token not held by client");
            return Err(invalid_refresh_token());
        }

        self.refresh(refresh_token).await
    }

    /// Drop expired access and refresh tokens, returning how many were removed.
    pub async fn sweep_expired(&self) -> Result<usize, TokenError> {
        let now = self.clock.now();
        let access = self
            .storage
            .cleanup_expired_tokens(now)
            .await
            .map_err(storage_failure)?;
        let refresh = self
            .storage
            .cleanup_expired_refresh_tokens(now)
            .await
            .map_err(storage_failure)?;
        Ok(access + refresh)
    }

    async fn exchange(&self, consumed: Option<RefreshToken>) -> Result<IssuedToken, TokenError> {
        let now = self.clock.now();
        let consumed = match consumed {
            Some(token) if token.is_active_at(now) => token,
            Some(token) => {
                tracing::debug!(client_id = %token.client_id, "refresh token expired");
                return Err(invalid_refresh_token());
            }
            None => return Err(invalid_refresh_token()),
        };

        self.storage
            .remove_token(&consumed.access_token)
            .await
            .map_err(storage_failure)?;

        let issued = self.grant(&consumed.client_id, consumed.scopes).await?;
        tracing::info!(
            client_id = %consumed.client_id,
            scopes = %issued.access_token.scopes,
            "refreshed access token"
        );
        Ok(issued)
    }

    async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Client, TokenError> {
        let client = match self.clients.get_by_id(client_id).await {
            Ok(client) => client,
            Err(RegistryError::ClientNotFound(_)) => {
                tracing::warn!(client_id = %client_id, "unknown client");
                return Err(TokenError::InvalidClient(INVALID_CLIENT_MESSAGE.to_string()));
            }
            Err(e) => return Err(TokenError::StorageFailure(e.to_string())),
        };

        if !verify_client_secret(&client, client_secret) {
            tracing::warn!(client_id = %client.id, "client secret mismatch");
            return Err(TokenError::InvalidClient(INVALID_CLIENT_MESSAGE.to_string()));
        }

        Ok(client)
    }

    async fn lookup(&self, access_token: &str) -> Result<Option<AccessToken>, TokenError> {
        self.storage
            .get_token(access_token)
            .await
            .map_err(storage_failure)
    }

    /// Mint and store an access token, plus a refresh token when enabled.
    async fn grant(&self, client_id: &str, scopes: ScopeSet) -> Result<IssuedToken, TokenError> {
        let now = self.clock.now();

        let mut access_token = None;
        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let candidate = AccessToken {
                token: generate_token(),
                token_type: TokenType::Bearer,
                client_id: client_id.to_string(),
                scopes: scopes.clone(),
                created_at: now,
                expires_at: now + self.settings.access_token_ttl,
            };
            match self.storage.insert_token(&candidate).await {
                Ok(()) => {
                    access_token = Some(candidate);
                    break;
                }
                Err(StorageError::IdConflict(_)) => {
                    tracing::warn!(client_id = %client_id, attempt, "access token collision");
                }
                Err(e) => {
                    tracing::error!(error = ?e, "failed to store access token");
                    return Err(storage_failure(e));
                }
            }
        }
        let access_token = access_token.ok_or_else(|| {
            TokenError::StorageFailure("could not allocate a unique access token".to_string())
        })?;

        let Some(refresh_ttl) = self.settings.refresh_token_ttl else {
            return Ok(IssuedToken {
                access_token,
                refresh_token: None,
            });
        };

        match self.store_refresh_token(&access_token, refresh_ttl).await {
            Ok(refresh_token) => Ok(IssuedToken {
                access_token,
                refresh_token: Some(refresh_token),
            }),
            Err(e) => {
                // Never hand out half a pair.
                if let Err(remove_err) = self.storage.remove_token(&access_token.token).await {
                    tracing::error!(error = ?remove_err, "failed to roll back access token");
                }
                Err(e)
            }
        }
    }

    async fn store_refresh_token(
        &self,
        access_token: &AccessToken,
        refresh_ttl: Duration,
    ) -> Result<RefreshToken, TokenError> {
        let now = access_token.created_at;
        let client_id = &access_token.client_id;

        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let candidate = RefreshToken {
                token: generate_token(),
                access_token: access_token.token.clone(),
                client_id: client_id.clone(),
                scopes: access_token.scopes.clone(),
                created_at: now,
                expires_at: now + refresh_ttl,
            };
            match self.storage.insert_refresh_token(&candidate).await {
                Ok(()) => return Ok(candidate),
                Err(StorageError::IdConflict(_)) => {
                    tracing::warn!(client_id = %client_id, attempt, "refresh token collision");
                }
                Err(e) => {
                    tracing::error!(error = ?e, "failed to store refresh token");
                    return Err(storage_failure(e));
                }
            }
        }

        Err(TokenError::StorageFailure(
            "could not allocate a unique refresh token".to_string(),
        ))
    }
}

fn storage_failure(e: StorageError) -> TokenError {
    TokenError::StorageFailure(e.to_string())
}

fn invalid_refresh_token() -> TokenError {
    TokenError::InvalidOrExpired("refresh token is invalid or expired".to_string())
}
