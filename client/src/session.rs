//! Gateway session: connect, identify, merge pushed frames, reconnect.
//!
//! The socket is a latency optimization, not the system of record; the
//! polling task in [`crate::poll`] replaces the list wholesale on a fixed
//! interval whether or not the socket is up.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::poll;
use crate::store::OrderStore;

/// Fixed delay between reconnect attempts. No backoff growth and no retry
/// cap; the gateway treats a reconnect like any fresh connection.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Fixed REST polling interval, independent of socket state.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Gateway base URL, e.g. `ws://localhost:3333`
    pub gateway_url: String,
    /// REST base URL, e.g. `http://localhost:3333`
    pub api_url: String,
    /// Bearer token; also carried as the `token` query parameter on the
    /// handshake, since the browser WebSocket API has no headers.
    pub token: String,
    pub reconnect_delay: Duration,
    pub poll_interval: Duration,
}

impl SessionConfig {
    pub fn new(
        gateway_url: impl Into<String>,
        api_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            gateway_url: gateway_url.into(),
            api_url: api_url.into(),
            token: token.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// A running client session: one socket task, one poll task, one shared
/// order store.
pub struct ClientSession {
    store: Arc<Mutex<OrderStore>>,
    shutdown_tx: watch::Sender<bool>,
    socket_task: JoinHandle<()>,
    poll_task: JoinHandle<()>,
}

impl ClientSession {
    /// Spawn the socket and polling tasks and return a handle to the
    /// session.
    pub fn spawn(config: SessionConfig) -> Self {
        let store = Arc::new(Mutex::new(OrderStore::new()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let socket_task = tokio::spawn(run_socket_loop(
            config.clone(),
            store.clone(),
            shutdown_rx.clone(),
        ));
        let poll_task = tokio::spawn(poll::run_poll_loop(config, store.clone(), shutdown_rx));

        Self {
            store,
            shutdown_tx,
            socket_task,
            poll_task,
        }
    }

    /// Snapshot of the current local order list.
    pub fn orders(&self) -> Vec<crate::normalize::LocalOrder> {
        self.store.lock().map(|s| s.orders().to_vec()).unwrap_or_default()
    }

    /// Stop both tasks and wait for them to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.socket_task.await;
        let _ = self.poll_task.await;
    }
}

/// Connect, identify, consume frames; on any close, wait the fixed delay
/// and try again, forever.
async fn run_socket_loop(
    config: SessionConfig,
    store: Arc<Mutex<OrderStore>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let ws_url = format!("{}/ws?token={}", config.gateway_url, config.token);

    loop {
        match tokio_tungstenite::connect_async(&ws_url).await {
            Ok((stream, _)) => {
                tracing::debug!("Gateway socket connected");
                let (mut write, mut read) = stream.split();

                let identify = json!({"kind": "identify", "payload": {"token": config.token}});
                if write.send(Message::Text(identify.to_string())).await.is_ok() {
                    loop {
                        tokio::select! {
                            _ = shutdown_rx.changed() => return,
                            msg = read.next() => match msg {
                                Some(Ok(Message::Text(text))) => handle_frame(&store, &text),
                                Some(Ok(Message::Ping(data))) => {
                                    let _ = write.send(Message::Pong(data)).await;
                                }
                                Some(Ok(Message::Close(frame))) => {
                                    tracing::debug!(reason = ?frame, "Gateway closed the socket");
                                    break;
                                }
                                Some(Ok(_)) => {}
                                Some(Err(e)) => {
                                    tracing::warn!(error = %e, "Socket receive error");
                                    break;
                                }
                                None => break,
                            }
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Gateway connection failed");
            }
        }

        // Fixed-delay reconnect; the poll bounds staleness meanwhile
        tokio::select! {
            _ = shutdown_rx.changed() => return,
            _ = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }
}

/// Decode one pushed envelope and apply it to the store.
fn handle_frame(store: &Arc<Mutex<OrderStore>>, text: &str) {
    let envelope: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed frame from gateway, ignoring");
            return;
        }
    };

    let Ok(mut store) = store.lock() else {
        return;
    };

    match envelope["kind"].as_str() {
        Some("pedidos") => {
            let orders = envelope["payload"].as_array().cloned().unwrap_or_default();
            store.replace_all(&orders);
            tracing::debug!(count = store.len(), "Order snapshot applied");
        }
        Some("order-update") => {
            let payload = &envelope["payload"];
            if let Some(order_id) = payload["orderId"].as_i64() {
                store.apply_update(order_id, &payload["order"]);
            }
        }
        Some("new-order") => {
            store.prepend(&envelope["payload"]);
        }
        other => {
            tracing::debug!(kind = ?other, "Unknown frame kind, ignoring");
        }
    }
}
