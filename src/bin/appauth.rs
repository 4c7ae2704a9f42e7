//! appauth server binary.
//!
//! Wires the registries and token authority to the HTTP router, runs the
//! expired-token sweeper, and shuts down gracefully on SIGINT or SIGTERM.

use appauth::{
    config::Config,
    http::{AppState, build_router},
    oauth::{
        ApplicationRegistry, ClientRegistry, CredentialDeriver, MemoryAuthStorage, SystemClock,
        TokenAuthority, run_token_sweeper,
    },
    storage::traits::AuthStorage,
};
use anyhow::Result;
use std::{env, sync::Arc};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "appauth=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();

    let version = appauth::config::version()?;

    env::args().for_each(|arg| {
        if arg == "--version" {
            println!("{version}");
            std::process::exit(0);
        }
    });

    tracing::info!(?version, "Starting appauth");

    let config = Config::new()?;

    let storage: Arc<dyn AuthStorage> = Arc::new(MemoryAuthStorage::new());
    let applications = Arc::new(ApplicationRegistry::new(storage.clone()));
    let clients = Arc::new(ClientRegistry::new(
        storage.clone(),
        CredentialDeriver::default(),
        config.client_domain.clone(),
    ));
    let tokens = Arc::new(TokenAuthority::new(
        storage,
        clients.clone(),
        Arc::new(SystemClock),
        config.token_settings(),
    ));

    let app_context = AppState {
        config: Arc::new(config.clone()),
        applications,
        clients,
        tokens: tokens.clone(),
    };

    let app = build_router(app_context);

    // Setup graceful shutdown
    let tracker = TaskTracker::new();
    let token = CancellationToken::new();

    {
        let tracker = tracker.clone();
        let inner_token = token.clone();

        let ctrl_c = async {
            if let Err(err) = signal::ctrl_c().await {
                tracing::error!("failed to install Ctrl+C handler: {}", err);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(err) => {
                    tracing::error!("failed to install SIGTERM handler: {}", err);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::spawn(async move {
            tokio::select! {
                () = inner_token.cancelled() => { },
                _ = terminate => {},
                _ = ctrl_c => {},
            }

            tracker.close();
            inner_token.cancel();
        });
    }

    // Start the expired-token sweeper
    tracker.spawn(run_token_sweeper(
        tokens,
        *config.token_sweep_interval.as_ref(),
        token.clone(),
    ));

    // Start HTTP server
    {
        let http_port = *config.http_port.as_ref();
        let inner_token = token.clone();
        tracker.spawn(async move {
            let bind_address = format!("0.0.0.0:{http_port}");
            tracing::info!("Starting server on {bind_address}");
            let listener = match TcpListener::bind(&bind_address).await {
                Ok(listener) => listener,
                Err(err) => {
                    tracing::error!("failed to bind {}: {}", bind_address, err);
                    inner_token.cancel();
                    return;
                }
            };

            let shutdown_token = inner_token.clone();
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_token.cancelled().await;
                    tracing::info!("axum graceful shutdown complete");
                })
                .await;
            if let Err(err) = result {
                tracing::error!("axum task failed: {}", err);
            }

            inner_token.cancel();
        });
    }

    tracker.wait().await;

    Ok(())
}
