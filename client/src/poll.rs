//! REST polling fallback.
//!
//! Runs on a fixed interval regardless of socket state and replaces the
//! local order list with the server's canonical answer. This is the
//! correctness backstop that bounds the staleness of any missed push.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::watch;

use crate::session::SessionConfig;
use crate::store::OrderStore;

/// Poll `GET /orders` forever; failures are logged and retried on the next
/// tick.
pub async fn run_poll_loop(
    config: SessionConfig,
    store: Arc<Mutex<OrderStore>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let client = reqwest::Client::new();
    let url = format!("{}/orders", config.api_url);
    let mut timer = tokio::time::interval(config.poll_interval);
    // The first tick fires immediately, giving the session its initial list
    timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => return,
            _ = timer.tick() => {}
        }

        match fetch_orders(&client, &url, &config.token).await {
            Ok(orders) => {
                if let Ok(mut store) = store.lock() {
                    store.replace_all(&orders);
                    tracing::debug!(count = store.len(), "Poll applied");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Order poll failed");
            }
        }
    }
}

async fn fetch_orders(
    client: &reqwest::Client,
    url: &str,
    token: &str,
) -> Result<Vec<Value>, reqwest::Error> {
    client
        .get(url)
        .bearer_auth(token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}
