//! Client registration with derived credentials.

use chrono::Utc;
use std::sync::Arc;

use super::credentials::{CredentialDeriver, secret_digest};
use super::scope::ScopeSet;
use super::types::{Application, Client, RegisteredClient};
use crate::errors::{RegistryError, StorageError};
use crate::storage::traits::AuthStorage;

/// Attempts at deriving an unused client id before giving up.
pub const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Registry of clients, keyed by derived client id.
pub struct ClientRegistry {
    storage: Arc<dyn AuthStorage>,
    deriver: CredentialDeriver,
    /// Domain recorded on newly registered clients
    default_domain: String,
}

impl ClientRegistry {
    pub fn new(
        storage: Arc<dyn AuthStorage>,
        deriver: CredentialDeriver,
        default_domain: String,
    ) -> Self {
        Self {
            storage,
            deriver,
            default_domain,
        }
    }

    /// Register a client for an already-resolved application.
    ///
    /// The returned [`RegisteredClient`] carries the only plaintext copy of the
    /// client secret.
    pub async fn register_client(
        &self,
        application: &Application,
        requested_scopes: ScopeSet,
    ) -> Result<RegisteredClient, RegistryError> {
        if !requested_scopes.is_subset_of(&application.scopes) {
            let missing = requested_scopes.missing_from(&application.scopes);
            tracing::debug!(
                application_id = %application.id,
                missing = ?missing,
                "client scopes exceed application scopes"
            );
            return Err(RegistryError::ScopeNotGranted(format!(
                "application '{}' does not grant: {}",
                application.name,
                missing.join(" ")
            )));
        }

        for attempt in 1..=MAX_CREDENTIAL_ATTEMPTS {
            let client_id = self.deriver.derive_id(&application.name, &requested_scopes);
            let client_secret = self
                .deriver
                .derive_secret(&application.name, &requested_scopes);

            let client = Client {
                id: client_id,
                secret_digest: secret_digest(&client_secret),
                application_id: application.id.clone(),
                application_name: application.name.clone(),
                granted_scopes: requested_scopes.clone(),
                domain: self.default_domain.clone(),
                created_at: Utc::now(),
            };

            match self.storage.insert_client(&client).await {
                Ok(()) => {
                    tracing::info!(
                        client_id = %client.id,
                        application_id = %client.application_id,
                        scopes = %client.granted_scopes,
                        "registered client"
                    );
                    return Ok(RegisteredClient {
                        client,
                        client_secret,
                    });
                }
                Err(StorageError::IdConflict(_)) => {
                    tracing::warn!(
                        application_id = %application.id,
                        attempt,
                        "derived client id collision"
                    );
                }
                Err(e) => {
                    tracing::error!(error = ?e, "failed to store client");
                    return Err(RegistryError::StorageFailure(e.to_string()));
                }
            }
        }

        Err(RegistryError::StorageFailure(format!(
            "could not derive a unique client id for application '{}' after {} attempts",
            application.name, MAX_CREDENTIAL_ATTEMPTS
        )))
    }

    /// Look up a client by id.
    pub async fn get_by_id(&self, client_id: &str) -> Result<Client, RegistryError> {
        self.storage
            .get_client(client_id)
            .await
            .map_err(|e| RegistryError::StorageFailure(e.to_string()))?
            .ok_or_else(|| RegistryError::ClientNotFound(client_id.to_string()))
    }

    /// All clients registered for an application, oldest first.
    pub async fn list_for_application(
        &self,
        application_id: &str,
    ) -> Result<Vec<Client>, RegistryError> {
        self.storage
            .list_application_clients(application_id)
            .await
            .map_err(|e| RegistryError::StorageFailure(e.to_string()))
    }
}
