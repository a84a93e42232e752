//! Inbound frame router.
//!
//! Every frame in both directions is a JSON envelope `{kind, payload}`.
//! Malformed or unknown frames are logged and dropped; they never close
//! the connection.

use serde::{Deserialize, Serialize};

use crate::auth::middleware::Claims;
use crate::auth::Role;
use crate::orders::snapshot::{OrderSnapshotProvider, SqliteSnapshotProvider};
use crate::state::AppState;
use crate::ws::dispatch;

/// Wire envelope for every frame in both directions.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Handle one inbound text frame: decode the envelope and dispatch by kind.
pub async fn handle_frame(text: &str, state: &AppState, claims: &Claims) {
    let envelope: Envelope = match serde_json::from_str(text) {
        Ok(env) => env,
        Err(e) => {
            tracing::warn!(
                user_id = claims.sub,
                error = %e,
                "Malformed frame, ignoring"
            );
            return;
        }
    };

    match envelope.kind.as_str() {
        "identify" => handle_identify(state, claims).await,
        other => {
            tracing::debug!(
                user_id = claims.sub,
                kind = other,
                "Unknown message kind, ignoring"
            );
        }
    }
}

/// `identify`: the application-layer readiness signal sent after the
/// transport-layer handshake already authenticated the user.
///
/// Merchants get a `pedidos` snapshot of their restaurant's active orders
/// pushed back on the same connection. Customers get nothing here — their
/// initial list comes over REST, and updates arrive reactively.
async fn handle_identify(state: &AppState, claims: &Claims) {
    if claims.role != Role::Lojista {
        return;
    }

    let db = state.db.clone();
    let owner_id = claims.sub;

    let snapshot = tokio::task::spawn_blocking(move || {
        let provider = SqliteSnapshotProvider::new(db);
        match provider.restaurant_for_owner(owner_id)? {
            Some(restaurant_id) => provider.active_orders(restaurant_id),
            None => Ok(Vec::new()),
        }
    })
    .await;

    match snapshot {
        Ok(Ok(orders)) => {
            tracing::debug!(
                user_id = owner_id,
                count = orders.len(),
                "Sending active-order snapshot"
            );
            match serde_json::to_value(&orders) {
                Ok(payload) => {
                    dispatch::push(&state.connections, owner_id, "pedidos", payload);
                }
                Err(e) => {
                    tracing::warn!(user_id = owner_id, error = %e, "Snapshot serialization failed");
                }
            }
        }
        Ok(Err(e)) => {
            // No pedidos frame for this identify; the client recovers on
            // its next REST poll and still receives reactive pushes.
            tracing::warn!(user_id = owner_id, error = %e, "Order snapshot query failed");
        }
        Err(e) => {
            tracing::warn!(user_id = owner_id, error = %e, "Snapshot task failed");
        }
    }
}
