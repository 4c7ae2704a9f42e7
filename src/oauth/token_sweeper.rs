//! Background task that periodically drops expired tokens.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::token_authority::TokenAuthority;

/// Sweep expired tokens every `interval` until `cancellation_token` fires.
pub async fn run_token_sweeper(
    authority: Arc<TokenAuthority>,
    interval: Duration,
    cancellation_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    tracing::info!(interval = ?interval, "token sweeper started");
    loop {
        tokio::select! {
            () = cancellation_token.cancelled() => break,
            _ = ticker.tick() => {
                match authority.sweep_expired().await {
                    Ok(0) => {}
                    Ok(removed) => tracing::debug!(removed, "swept expired tokens"),
                    Err(err) => tracing::error!(error = ?err, "token sweep failed"),
                }
            }
        }
    }
    tracing::info!("token sweeper stopped");
}
