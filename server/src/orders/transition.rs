//! Order status state machine and its push side-effects.
//!
//! The realtime layer never originates a status change; the mutation
//! endpoints call in here, and on every accepted transition exactly two
//! targeted pushes go out: one to the owning customer, one to the
//! restaurant owner. Push failures never roll back a transition.

use serde_json::json;
use thiserror::Error;

use crate::orders::model::Order;
use crate::orders::snapshot::{OrderSnapshotProvider, SqliteSnapshotProvider};
use crate::orders::status::OrderStatus;
use crate::state::AppState;
use crate::ws::dispatch;

#[derive(Debug, Error)]
pub enum TransitionError {
    /// The requested transition is not in the allowed set for the order's
    /// current status, or the current status is terminal.
    #[error("invalid transition: {from:?} -> {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("order {0} not found")]
    NotFound(i64),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Apply a status transition to an order.
///
/// Validates against the transition table, persists the new status, then
/// pushes `order-update` to the owning customer and the restaurant owner.
/// Rejection triggers zero pushes.
pub async fn transition(
    state: &AppState,
    order_id: i64,
    new_status: OrderStatus,
) -> Result<Order, TransitionError> {
    let db = state.db.clone();

    // Validate and persist in a single blocking section so two concurrent
    // transitions on the same order cannot both pass the table check.
    let updated = tokio::task::spawn_blocking(move || {
        {
            let conn = db
                .lock()
                .map_err(|e| TransitionError::Storage(format!("DB lock error: {}", e)))?;

            let current: String = conn
                .query_row("SELECT status FROM orders WHERE id = ?1", [order_id], |row| {
                    row.get(0)
                })
                .map_err(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => TransitionError::NotFound(order_id),
                    other => TransitionError::Storage(other.to_string()),
                })?;

            let current = OrderStatus::from_str(&current).ok_or_else(|| {
                TransitionError::Storage(format!("unknown stored status: {}", current))
            })?;

            if !current.can_transition_to(new_status) {
                return Err(TransitionError::InvalidTransition {
                    from: current,
                    to: new_status,
                });
            }

            conn.execute(
                "UPDATE orders SET status = ?1 WHERE id = ?2",
                rusqlite::params![new_status.as_str(), order_id],
            )
            .map_err(|e| TransitionError::Storage(e.to_string()))?;
        }

        // Reload the full order for the push payload
        let provider = SqliteSnapshotProvider::new(db);
        let order = provider
            .order_detail(order_id)
            .map_err(|e| TransitionError::Storage(e.to_string()))?
            .ok_or(TransitionError::NotFound(order_id))?;
        let owner_id = provider
            .restaurant_owner(order.restaurant.id)
            .map_err(|e| TransitionError::Storage(e.to_string()))?;
        Ok((order, owner_id))
    })
    .await
    .map_err(|e| TransitionError::Storage(e.to_string()))?;

    let (order, owner_id) = updated?;

    tracing::info!(
        order_id,
        status = new_status.as_str(),
        "Order status transitioned"
    );

    notify_order_update(state, &order, owner_id);

    Ok(order)
}

/// Push `order-update` to the two interested parties. Offline recipients
/// are silent no-ops inside the dispatcher.
fn notify_order_update(state: &AppState, order: &Order, restaurant_owner_id: Option<i64>) {
    let payload = json!({
        "orderId": order.id,
        "order": order,
        "type": "status-update",
    });

    dispatch::push(
        &state.connections,
        order.customer.id,
        "order-update",
        payload.clone(),
    );

    if let Some(owner_id) = restaurant_owner_id {
        dispatch::push(&state.connections, owner_id, "order-update", payload);
    }
}

/// Push `new-order` to the restaurant owner when an order is created.
/// There is no prior status transition on the creation path.
pub fn notify_new_order(state: &AppState, order: &Order, restaurant_owner_id: i64) {
    match serde_json::to_value(order) {
        Ok(payload) => {
            dispatch::push(&state.connections, restaurant_owner_id, "new-order", payload);
        }
        Err(e) => {
            tracing::warn!(order_id = order.id, error = %e, "new-order serialization failed");
        }
    }
}
