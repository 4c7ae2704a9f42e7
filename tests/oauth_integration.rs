//! Registry and token lifecycle integration tests
//!
//! These tests drive the public API end to end: application and client
//! registration under concurrency, the client credentials grant, expiry, and
//! single-use refresh tokens.

use appauth::errors::{RegistryError, TokenError};
use appauth::oauth::{
    ApplicationRegistry, ClientRegistry, CredentialDeriver, ManualClock, MemoryAuthStorage,
    ScopeSet, TokenAuthority, TokenSettings,
};
use chrono::Duration;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;

struct Services {
    clock: Arc<ManualClock>,
    applications: Arc<ApplicationRegistry>,
    clients: Arc<ClientRegistry>,
    tokens: Arc<TokenAuthority>,
}

fn services() -> Services {
    let storage = Arc::new(MemoryAuthStorage::new());
    let clock = Arc::new(ManualClock::default());
    let clients = Arc::new(ClientRegistry::new(
        storage.clone(),
        CredentialDeriver::default(),
        "http://localhost:9094".to_string(),
    ));
    Services {
        clock: clock.clone(),
        applications: Arc::new(ApplicationRegistry::new(storage.clone())),
        clients: clients.clone(),
        tokens: Arc::new(TokenAuthority::new(
            storage,
            clients,
            clock,
            TokenSettings::default(),
        )),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_distinct_registrations() {
    let services = services();

    let handles = (0..100).map(|i| {
        let applications = services.applications.clone();
        tokio::spawn(async move {
            applications
                .register_application(&format!("app-{i}"), ScopeSet::parse("read"))
                .await
        })
    });

    let ids: Vec<String> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let distinct: HashSet<_> = ids.iter().collect();
    assert_eq!(distinct.len(), 100);
    assert_eq!(services.applications.list(None).await.unwrap().len(), 100);

    for i in 0..100 {
        services
            .applications
            .get_by_name(&format!("app-{i}"))
            .await
            .unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_same_name_registers_once() {
    let services = services();

    let handles = (0..32).map(|i| {
        let applications = services.applications.clone();
        tokio::spawn(async move {
            applications
                .register_application("billing", ScopeSet::parse(&format!("scope-{i}")))
                .await
        })
    });

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!(
        results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(RegistryError::DuplicateName(_))))
    );

    let stored = services.applications.get_by_name("billing").await.unwrap();
    assert_eq!(&stored.id, winners[0]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_client_registrations_are_distinct() {
    let services = services();
    let application_id = services
        .applications
        .register_application("billing", ScopeSet::parse("read write"))
        .await
        .unwrap();
    let application = Arc::new(services.applications.get_by_id(&application_id).await.unwrap());

    let handles = (0..50).map(|_| {
        let clients = services.clients.clone();
        let application = application.clone();
        tokio::spawn(async move {
            clients
                .register_client(&application, ScopeSet::parse("read"))
                .await
        })
    });

    let registered: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let ids: HashSet<_> = registered.iter().map(|r| r.client.id.clone()).collect();
    let secrets: HashSet<_> = registered.iter().map(|r| r.client_secret.clone()).collect();
    assert_eq!(ids.len(), 50);
    assert_eq!(secrets.len(), 50);
    assert_eq!(
        services
            .clients
            .list_for_application(&application_id)
            .await
            .unwrap()
            .len(),
        50
    );
}

#[tokio::test]
async fn test_client_credentials_lifecycle() {
    let services = services();

    let application_id = services
        .applications
        .register_application("billing", ScopeSet::parse("read write"))
        .await
        .unwrap();
    let application = services.applications.get_by_id(&application_id).await.unwrap();

    let denied = services
        .clients
        .register_client(&application, ScopeSet::parse("admin"))
        .await;
    assert!(matches!(denied, Err(RegistryError::ScopeNotGranted(_))));

    let client = services
        .clients
        .register_client(&application, ScopeSet::parse("read"))
        .await
        .unwrap();

    let requested = ScopeSet::parse("read");
    let issued = services
        .tokens
        .issue_token(&client.client.id, &client.client_secret, Some(&requested))
        .await
        .unwrap();
    let access_token = issued.access_token.token.clone();

    services.tokens.validate(&access_token).await.unwrap();
    let info = services.tokens.inspect(&access_token).await.unwrap();
    assert_eq!(info.client_id, client.client.id);
    assert_eq!(info.scopes, requested);

    let escalated = services
        .tokens
        .issue_token(
            &client.client.id,
            &client.client_secret,
            Some(&ScopeSet::parse("read write")),
        )
        .await;
    assert!(matches!(escalated, Err(TokenError::ScopeNotGranted(_))));

    services.clock.advance(Duration::seconds(3601));
    assert!(matches!(
        services.tokens.validate(&access_token).await,
        Err(TokenError::InvalidOrExpired(_))
    ));

    // The refresh token outlives the access token.
    let refreshed = services
        .tokens
        .refresh(&issued.refresh_token.unwrap().token)
        .await
        .unwrap();
    services
        .tokens
        .validate(&refreshed.access_token.token)
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refresh_succeeds_once() {
    let services = services();
    let application_id = services
        .applications
        .register_application("billing", ScopeSet::parse("read"))
        .await
        .unwrap();
    let application = services.applications.get_by_id(&application_id).await.unwrap();
    let client = services
        .clients
        .register_client(&application, ScopeSet::parse("read"))
        .await
        .unwrap();
    let issued = services
        .tokens
        .issue_token(&client.client.id, &client.client_secret, None)
        .await
        .unwrap();
    let refresh_token = Arc::new(issued.refresh_token.unwrap().token);

    let handles = (0..16).map(|_| {
        let tokens = services.tokens.clone();
        let refresh_token = refresh_token.clone();
        tokio::spawn(async move { tokens.refresh(&refresh_token).await })
    });

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(TokenError::InvalidOrExpired(_))))
    );
}
