//! Outbound push primitive.
//!
//! Best-effort, at-most-once delivery: an offline recipient or a dead
//! channel is a silent no-op, never an error. The REST polling fallback is
//! the correctness backstop for order state; a push only shaves latency.

use axum::extract::ws::Message;
use serde_json::json;

use super::ConnectionRegistry;

/// Push a `{kind, payload}` envelope to a single user's connection, if any.
///
/// Never fails and never reports failure to the caller: the order-mutation
/// path must not be affected by the recipient being offline or the channel
/// closing mid-write.
pub fn push(registry: &ConnectionRegistry, user_id: i64, kind: &str, payload: serde_json::Value) {
    let Some(tx) = registry.lookup(user_id) else {
        tracing::debug!(user_id, kind, "Push skipped: user offline");
        return;
    };

    let frame = json!({ "kind": kind, "payload": payload }).to_string();

    if tx.send(Message::Text(frame.into())).is_err() {
        // Channel closed between lookup and write — same as offline
        tracing::debug!(user_id, kind, "Push dropped: channel closed");
    }
}
