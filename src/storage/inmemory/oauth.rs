//! In-memory storage implementation
//!
//! Applications, clients, access tokens, and refresh tokens each live behind
//! their own mutex. Every lock is held only for a single map operation.

use crate::errors::StorageError;
use crate::oauth::types::*;
use crate::storage::traits::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

pub type Result<T> = std::result::Result<T, StorageError>;

/// Applications keyed by name with a secondary id index.
#[derive(Default)]
struct ApplicationTable {
    by_name: BTreeMap<String, Application>,
    name_by_id: HashMap<String, String>,
}

/// In-memory implementation for auth storage
#[derive(Default)]
pub struct MemoryAuthStorage {
    applications: Mutex<ApplicationTable>,
    clients: Mutex<HashMap<String, Client>>,
    access_tokens: Mutex<HashMap<String, AccessToken>>,
    refresh_tokens: Mutex<HashMap<String, RefreshToken>>,
}

impl MemoryAuthStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|e| StorageError::LockPoisoned(format!("{} lock: {}", name, e)))
}

#[async_trait]
impl ApplicationStore for MemoryAuthStorage {
    async fn insert_application(&self, application: &Application) -> Result<()> {
        let mut table = lock(&self.applications, "applications")?;
        if table.by_name.contains_key(&application.name) {
            return Err(StorageError::NameConflict(application.name.clone()));
        }
        if table.name_by_id.contains_key(&application.id) {
            return Err(StorageError::IdConflict(application.id.clone()));
        }
        table
            .name_by_id
            .insert(application.id.clone(), application.name.clone());
        table
            .by_name
            .insert(application.name.clone(), application.clone());
        Ok(())
    }

    async fn get_application_by_name(&self, name: &str) -> Result<Option<Application>> {
        let table = lock(&self.applications, "applications")?;
        Ok(table.by_name.get(name).cloned())
    }

    async fn get_application_by_id(&self, id: &str) -> Result<Option<Application>> {
        let table = lock(&self.applications, "applications")?;
        Ok(table
            .name_by_id
            .get(id)
            .and_then(|name| table.by_name.get(name))
            .cloned())
    }

    async fn list_applications(&self, limit: Option<usize>) -> Result<Vec<Application>> {
        let table = lock(&self.applications, "applications")?;
        let applications = table.by_name.values().cloned();
        Ok(match limit {
            Some(limit) => applications.take(limit).collect(),
            None => applications.collect(),
        })
    }
}

#[async_trait]
impl ClientStore for MemoryAuthStorage {
    async fn insert_client(&self, client: &Client) -> Result<()> {
        let mut clients = lock(&self.clients, "clients")?;
        if clients.contains_key(&client.id) {
            return Err(StorageError::IdConflict(client.id.clone()));
        }
        clients.insert(client.id.clone(), client.clone());
        Ok(())
    }

    async fn get_client(&self, client_id: &str) -> Result<Option<Client>> {
        let clients = lock(&self.clients, "clients")?;
        Ok(clients.get(client_id).cloned())
    }

    async fn list_application_clients(&self, application_id: &str) -> Result<Vec<Client>> {
        let clients = lock(&self.clients, "clients")?;
        let mut result: Vec<_> = clients
            .values()
            .filter(|client| client.application_id == application_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(result)
    }
}

#[async_trait]
impl AccessTokenStore for MemoryAuthStorage {
    async fn insert_token(&self, token: &AccessToken) -> Result<()> {
        let mut tokens = lock(&self.access_tokens, "access_tokens")?;
        if tokens.contains_key(&token.token) {
            return Err(StorageError::IdConflict("access token".to_string()));
        }
        tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn get_token(&self, token: &str) -> Result<Option<AccessToken>> {
        let tokens = lock(&self.access_tokens, "access_tokens")?;
        Ok(tokens.get(token).cloned())
    }

    async fn remove_token(&self, token: &str) -> Result<Option<AccessToken>> {
        let mut tokens = lock(&self.access_tokens, "access_tokens")?;
        Ok(tokens.remove(token))
    }

    async fn cleanup_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut tokens = lock(&self.access_tokens, "access_tokens")?;
        let before = tokens.len();
        tokens.retain(|_, token| token.is_active_at(now));
        Ok(before - tokens.len())
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryAuthStorage {
    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<()> {
        let mut tokens = lock(&self.refresh_tokens, "refresh_tokens")?;
        if tokens.contains_key(&token.token) {
            return Err(StorageError::IdConflict("refresh token".to_string()));
        }
        tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>> {
        let tokens = lock(&self.refresh_tokens, "refresh_tokens")?;
        Ok(tokens.get(token).cloned())
    }

    async fn consume_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>> {
        let mut tokens = lock(&self.refresh_tokens, "refresh_tokens")?;
        Ok(tokens.remove(token))
    }

    async fn cleanup_expired_refresh_tokens(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut tokens = lock(&self.refresh_tokens, "refresh_tokens")?;
        let before = tokens.len();
        tokens.retain(|_, token| token.is_active_at(now));
        Ok(before - tokens.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::scope::ScopeSet;
    use chrono::Duration;

    fn application(id: &str, name: &str) -> Application {
        Application {
            id: id.to_string(),
            name: name.to_string(),
            scopes: ScopeSet::parse("read write"),
            created_at: Utc::now(),
        }
    }

    fn access_token(token: &str, expires_at: DateTime<Utc>) -> AccessToken {
        AccessToken {
            token: token.to_string(),
            token_type: TokenType::Bearer,
            client_id: "client".to_string(),
            scopes: ScopeSet::parse("read"),
            created_at: expires_at - Duration::hours(1),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_application_name_and_id_conflicts() {
        let storage = MemoryAuthStorage::new();
        storage
            .insert_application(&application("id-1", "billing"))
            .await
            .unwrap();

        let by_name = storage
            .insert_application(&application("id-2", "billing"))
            .await;
        assert!(matches!(by_name, Err(StorageError::NameConflict(name)) if name == "billing"));

        let by_id = storage
            .insert_application(&application("id-1", "shipping"))
            .await;
        assert!(matches!(by_id, Err(StorageError::IdConflict(id)) if id == "id-1"));

        // Rejected inserts leave no trace in either index.
        assert!(
            storage
                .get_application_by_name("shipping")
                .await
                .unwrap()
                .is_none()
        );
        assert!(storage.get_application_by_id("id-2").await.unwrap().is_none());
        assert_eq!(
            storage
                .get_application_by_id("id-1")
                .await
                .unwrap()
                .unwrap()
                .name,
            "billing"
        );
    }

    #[tokio::test]
    async fn test_list_applications_sorted_and_limited() {
        let storage = MemoryAuthStorage::new();
        for (id, name) in [("3", "zeta"), ("1", "alpha"), ("2", "mid")] {
            storage
                .insert_application(&application(id, name))
                .await
                .unwrap();
        }

        let names: Vec<_> = storage
            .list_applications(None)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
        assert_eq!(storage.list_applications(Some(2)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_token_consumed_once() {
        let storage = MemoryAuthStorage::new();
        let now = Utc::now();
        let refresh = RefreshToken {
            token: "rt".to_string(),
            access_token: "at".to_string(),
            client_id: "client".to_string(),
            scopes: ScopeSet::parse("read"),
            created_at: now,
            expires_at: now + Duration::hours(72),
        };
        storage.insert_refresh_token(&refresh).await.unwrap();

        assert!(storage.get_refresh_token("rt").await.unwrap().is_some());
        assert_eq!(storage.consume_refresh_token("rt").await.unwrap(), Some(refresh));
        assert!(storage.consume_refresh_token("rt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cleanup_expired_tokens_keeps_active() {
        let storage = MemoryAuthStorage::new();
        let now = Utc::now();
        storage
            .insert_token(&access_token("expired", now - Duration::seconds(1)))
            .await
            .unwrap();
        storage
            .insert_token(&access_token("boundary", now))
            .await
            .unwrap();
        storage
            .insert_token(&access_token("active", now + Duration::hours(1)))
            .await
            .unwrap();

        assert_eq!(storage.cleanup_expired_tokens(now).await.unwrap(), 1);
        assert!(storage.get_token("expired").await.unwrap().is_none());
        assert!(storage.get_token("boundary").await.unwrap().is_some());
        assert!(storage.get_token("active").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_access_token_rejected() {
        let storage = MemoryAuthStorage::new();
        let token = access_token("dup", Utc::now() + Duration::hours(1));
        storage.insert_token(&token).await.unwrap();
        assert!(matches!(
            storage.insert_token(&token).await,
            Err(StorageError::IdConflict(_))
        ));
    }
}
