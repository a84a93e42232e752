//! Order REST surface.
//!
//! `GET /orders` is the polling fallback the client runs regardless of
//! socket state; it returns the same Order shape as the push payloads so
//! push and poll stay reconcilable. The mutation endpoints feed the state
//! machine, which owns the push side-effects.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::middleware::Claims;
use crate::auth::Role;
use crate::orders::model::Order;
use crate::orders::snapshot::{OrderSnapshotProvider, SqliteSnapshotProvider};
use crate::orders::status::OrderStatus;
use crate::orders::transition::{self, TransitionError};
use crate::state::AppState;

/// GET /orders — JWT auth required.
/// Customers get their own orders; merchants get their restaurant's
/// active orders (the same list the `pedidos` snapshot carries).
pub async fn list_orders(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Vec<Order>>, StatusCode> {
    let db = state.db.clone();

    let orders = tokio::task::spawn_blocking(move || {
        let provider = SqliteSnapshotProvider::new(db);
        match claims.role {
            Role::Lojista => match provider.restaurant_for_owner(claims.sub)? {
                Some(restaurant_id) => provider.active_orders(restaurant_id),
                None => Ok(Vec::new()),
            },
            _ => provider.orders_for_customer(claims.sub),
        }
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .map_err(|e| {
        tracing::error!(error = %e, "Order list query failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(orders))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// PUT /orders/{id}/status — lojista (own restaurant) or admin.
/// Body: { "status": "preparing" | ... }
/// Runs the state machine; 422 on a transition outside the table.
pub async fn update_order_status(
    State(state): State<AppState>,
    claims: Claims,
    Path(order_id): Path<i64>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, StatusCode> {
    let new_status = OrderStatus::from_str(&body.status).ok_or(StatusCode::BAD_REQUEST)?;

    match claims.role {
        Role::Admin => {}
        Role::Lojista => {
            // Merchants may only touch orders of their own restaurant
            let db = state.db.clone();
            let owns = tokio::task::spawn_blocking(move || {
                let conn = db.lock().map_err(|_| ())?;
                conn.query_row(
                    "SELECT 1 FROM orders o JOIN restaurants r ON r.id = o.restaurant_id
                     WHERE o.id = ?1 AND r.owner_id = ?2",
                    rusqlite::params![order_id, claims.sub],
                    |_| Ok(()),
                )
                .map_err(|_| ())
            })
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

            if owns.is_err() {
                return Err(StatusCode::FORBIDDEN);
            }
        }
        Role::Cliente => return Err(StatusCode::FORBIDDEN),
    }

    match transition::transition(&state, order_id, new_status).await {
        Ok(order) => Ok(Json(order)),
        Err(TransitionError::InvalidTransition { from, to }) => {
            tracing::info!(order_id, from = from.as_str(), to = to.as_str(), "Transition rejected");
            Err(StatusCode::UNPROCESSABLE_ENTITY)
        }
        Err(TransitionError::NotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(TransitionError::Storage(e)) => {
            tracing::error!(order_id, error = %e, "Transition storage failure");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub restaurant_id: i64,
    pub address: String,
    pub items: Vec<CreateOrderItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItem {
    pub name: String,
    pub quantity: i64,
    pub unit_price: f64,
}

/// POST /orders — cliente only. Creates the order as `pending` and pushes
/// `new-order` to the restaurant owner (no prior transition exists on the
/// creation path).
pub async fn create_order(
    State(state): State<AppState>,
    claims: Claims,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), StatusCode> {
    if claims.role != Role::Cliente {
        return Err(StatusCode::FORBIDDEN);
    }
    if body.items.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let db = state.db.clone();
    let customer_id = claims.sub;

    let created = tokio::task::spawn_blocking(move || -> Result<(Order, i64), (StatusCode, String)> {
        let storage = |e: String| (StatusCode::INTERNAL_SERVER_ERROR, e);
        let order_id = {
            let conn = db
                .lock()
                .map_err(|e| storage(format!("DB lock error: {}", e)))?;

            let delivery_fee: f64 = conn
                .query_row(
                    "SELECT delivery_fee FROM restaurants WHERE id = ?1",
                    [body.restaurant_id],
                    |row| row.get(0),
                )
                .map_err(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => {
                        (StatusCode::NOT_FOUND, "restaurant not found".to_string())
                    }
                    other => storage(other.to_string()),
                })?;

            let subtotal: f64 = body
                .items
                .iter()
                .map(|item| item.unit_price * item.quantity as f64)
                .sum();

            conn.execute(
                "INSERT INTO orders (customer_id, restaurant_id, status, total, delivery_fee, address, created_at)
                 VALUES (?1, ?2, 'pending', ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    customer_id,
                    body.restaurant_id,
                    subtotal + delivery_fee,
                    delivery_fee,
                    body.address,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|e| storage(e.to_string()))?;
            let order_id = conn.last_insert_rowid();

            for item in &body.items {
                conn.execute(
                    "INSERT INTO order_items (order_id, name, quantity, unit_price)
                     VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![order_id, item.name, item.quantity, item.unit_price],
                )
                .map_err(|e| storage(e.to_string()))?;
            }
            order_id
        };

        let provider = SqliteSnapshotProvider::new(db);
        let order = provider
            .order_detail(order_id)
            .map_err(|e| storage(e.to_string()))?
            .ok_or_else(|| storage("order vanished after insert".to_string()))?;
        let owner_id = provider
            .restaurant_owner(order.restaurant.id)
            .map_err(|e| storage(e.to_string()))?
            .ok_or_else(|| storage("restaurant has no owner".to_string()))?;
        Ok((order, owner_id))
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let (order, owner_id) = created.map_err(|(code, e)| {
        if code.is_server_error() {
            tracing::error!(error = %e, "Order creation failed");
        } else {
            tracing::info!(error = %e, "Order creation rejected");
        }
        code
    })?;

    tracing::info!(order_id = order.id, customer_id, "Order created");
    transition::notify_new_order(&state, &order, owner_id);

    Ok((StatusCode::CREATED, Json(order)))
}
