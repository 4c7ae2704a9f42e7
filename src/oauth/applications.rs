//! Application registration and lookup.

use chrono::Utc;
use std::sync::Arc;

use super::scope::ScopeSet;
use super::types::{Application, generate_application_id};
use crate::errors::{RegistryError, StorageError};
use crate::storage::traits::AuthStorage;

/// Attempts at allocating an unused application id before giving up.
const MAX_ID_ATTEMPTS: usize = 3;

/// Registry of applications, keyed by unique name.
pub struct ApplicationRegistry {
    storage: Arc<dyn AuthStorage>,
}

impl ApplicationRegistry {
    pub fn new(storage: Arc<dyn AuthStorage>) -> Self {
        Self { storage }
    }

    /// Register a new application and return its id.
    ///
    /// Exactly one of several concurrent registrations for the same name
    /// succeeds; the others fail with [`RegistryError::DuplicateName`].
    pub async fn register_application(
        &self,
        name: &str,
        scopes: ScopeSet,
    ) -> Result<String, RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidRequest(
                "application name is required".to_string(),
            ));
        }
        if scopes.is_empty() {
            return Err(RegistryError::InvalidRequest(format!(
                "at least one scope is required for application '{}'",
                name
            )));
        }
        if let Some(invalid) = scopes.first_invalid() {
            return Err(RegistryError::InvalidRequest(format!(
                "invalid scope '{}' for application '{}'",
                invalid, name
            )));
        }

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let application = Application {
                id: generate_application_id(),
                name: name.to_string(),
                scopes: scopes.clone(),
                created_at: Utc::now(),
            };

            match self.storage.insert_application(&application).await {
                Ok(()) => {
                    tracing::info!(
                        application_id = %application.id,
                        application_name = %application.name,
                        scopes = %application.scopes,
                        "registered application"
                    );
                    return Ok(application.id);
                }
                Err(StorageError::NameConflict(_)) => {
                    tracing::debug!(application_name = %name, "duplicate application name");
                    return Err(RegistryError::DuplicateName(name.to_string()));
                }
                Err(StorageError::IdConflict(id)) => {
                    tracing::warn!(application_id = %id, attempt, "application id collision");
                }
                Err(e) => {
                    tracing::error!(error = ?e, "failed to store application");
                    return Err(RegistryError::StorageFailure(e.to_string()));
                }
            }
        }

        Err(RegistryError::StorageFailure(format!(
            "could not allocate a unique id for application '{}' after {} attempts",
            name, MAX_ID_ATTEMPTS
        )))
    }

    /// Look up an application by id.
    pub async fn get_by_id(&self, id: &str) -> Result<Application, RegistryError> {
        self.storage
            .get_application_by_id(id)
            .await
            .map_err(|e| RegistryError::StorageFailure(e.to_string()))?
            .ok_or_else(|| RegistryError::ApplicationNotFound(id.to_string()))
    }

    /// Look up an application by name.
    pub async fn get_by_name(&self, name: &str) -> Result<Application, RegistryError> {
        self.storage
            .get_application_by_name(name)
            .await
            .map_err(|e| RegistryError::StorageFailure(e.to_string()))?
            .ok_or_else(|| RegistryError::ApplicationNotFound(name.to_string()))
    }

    /// List applications ordered by name.
    pub async fn list(&self, limit: Option<usize>) -> Result<Vec<Application>, RegistryError> {
        self.storage
            .list_applications(limit)
            .await
            .map_err(|e| RegistryError::StorageFailure(e.to_string()))
    }
}
