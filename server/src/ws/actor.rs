use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::auth::middleware::Claims;
use crate::state::AppState;
use crate::ws::protocol;

/// Close code sent to a connection evicted by a newer one for the same user.
const CLOSE_REPLACED: u16 = 4000;

/// Run the actor-per-connection pattern for an authenticated WebSocket.
///
/// Splits the WebSocket into reader and writer halves:
/// - Writer task: owns the sink, forwards messages from an mpsc channel
/// - Reader loop: processes incoming frames, dispatches into the router
///
/// The mpsc channel allows any part of the system to send messages to this
/// client by cloning the sender; per-channel FIFO ordering comes from the
/// mpsc plus the single writer task.
pub async fn run_connection(socket: WebSocket, state: AppState, claims: Claims) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    // Register this connection; a previous connection for the same user is
    // evicted (last writer wins) and told why before we let it go.
    if let Some(evicted) = state.connections.register(claims.sub, tx.clone()) {
        let _ = evicted.send(Message::Close(Some(CloseFrame {
            code: CLOSE_REPLACED,
            reason: "Session replaced by a newer connection".into(),
        })));
        tracing::info!(user_id = claims.sub, "Evicted previous connection");
    }

    tracing::info!(
        user_id = claims.sub,
        role = claims.role.as_str(),
        "WebSocket actor started"
    );

    // Spawn writer task: forwards mpsc messages to WebSocket sink
    let writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    // Reader loop: process incoming WebSocket messages
    loop {
        match ws_receiver.next().await {
            Some(Ok(msg)) => match msg {
                Message::Text(text) => {
                    protocol::handle_frame(text.as_str(), &state, &claims).await;
                }
                Message::Binary(_) => {
                    // The protocol is JSON text frames
                    tracing::debug!(user_id = claims.sub, "Ignoring binary frame");
                }
                Message::Ping(data) => {
                    // Respond to client pings with pong
                    let _ = tx.send(Message::Pong(data));
                }
                Message::Pong(_) => {}
                Message::Close(frame) => {
                    tracing::info!(
                        user_id = claims.sub,
                        reason = ?frame,
                        "Client initiated close"
                    );
                    break;
                }
            },
            Some(Err(e)) => {
                tracing::warn!(
                    user_id = claims.sub,
                    error = %e,
                    "WebSocket receive error"
                );
                break;
            }
            None => {
                // Stream ended — client disconnected
                tracing::info!(user_id = claims.sub, "WebSocket stream ended");
                break;
            }
        }
    }

    // Cleanup: abort the writer and release the registry slot. The
    // unregister is identity-guarded so a connection that was already
    // replaced does not evict its replacement.
    writer_handle.abort();
    state.connections.unregister(claims.sub, &tx);

    tracing::info!(user_id = claims.sub, "WebSocket actor stopped");
}

/// Writer task: receives messages from mpsc channel and forwards them to the WebSocket sink.
async fn writer_task(
    mut ws_sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if ws_sender.send(msg).await.is_err() {
            // WebSocket send failed — connection is broken
            break;
        }
    }
}
