//! Storage-backed order snapshots.
//!
//! The realtime layer consumes these read paths in two places: the
//! `identify` handler (merchant's active-order snapshot) and the status
//! transition path (full order detail for the push payload).

use rusqlite::Connection;

use crate::db::DbPool;
use crate::orders::model::{CustomerRef, Order, OrderItem, RestaurantRef};
use crate::orders::status::OrderStatus;

pub type SnapshotError = Box<dyn std::error::Error + Send + Sync>;

/// Read access to current order state.
pub trait OrderSnapshotProvider {
    /// Active (non-terminal) orders for a restaurant, newest first.
    fn active_orders(&self, restaurant_id: i64) -> Result<Vec<Order>, SnapshotError>;

    /// Full detail for a single order, or None if it does not exist.
    fn order_detail(&self, order_id: i64) -> Result<Option<Order>, SnapshotError>;
}

/// Snapshot provider over the shared SQLite pool.
/// Queries are synchronous; callers run them inside spawn_blocking.
pub struct SqliteSnapshotProvider {
    db: DbPool,
}

const ORDER_SELECT: &str = "SELECT o.id, o.status, o.total, o.delivery_fee, o.address, o.created_at,
        u.id, u.name, COALESCE(u.phone, ''),
        r.id, r.name
 FROM orders o
 JOIN users u ON u.id = o.customer_id
 JOIN restaurants r ON r.id = o.restaurant_id";

impl SqliteSnapshotProvider {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// The restaurant owned by a merchant account, if any.
    pub fn restaurant_for_owner(&self, owner_id: i64) -> Result<Option<i64>, SnapshotError> {
        let conn = self.db.lock().map_err(|e| format!("DB lock error: {}", e))?;
        let id = conn
            .query_row(
                "SELECT id FROM restaurants WHERE owner_id = ?1",
                [owner_id],
                |row| row.get::<_, i64>(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(id)
    }

    /// The user id of a restaurant's owner.
    pub fn restaurant_owner(&self, restaurant_id: i64) -> Result<Option<i64>, SnapshotError> {
        let conn = self.db.lock().map_err(|e| format!("DB lock error: {}", e))?;
        let id = conn
            .query_row(
                "SELECT owner_id FROM restaurants WHERE id = ?1",
                [restaurant_id],
                |row| row.get::<_, i64>(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(id)
    }
}

impl SqliteSnapshotProvider {
    /// All orders placed by a customer, newest first. This is the
    /// customer side of the polling fallback; customers have no bulk
    /// snapshot over the socket.
    pub fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, SnapshotError> {
        let conn = self.db.lock().map_err(|e| format!("DB lock error: {}", e))?;

        let sql = format!(
            "{} WHERE o.customer_id = ?1 ORDER BY o.created_at DESC, o.id DESC",
            ORDER_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut orders: Vec<Order> = stmt
            .query_map([customer_id], order_from_row)?
            .collect::<Result<_, _>>()?;

        for order in &mut orders {
            order.items = items_for_order(&conn, order.id)?;
        }

        Ok(orders)
    }
}

impl OrderSnapshotProvider for SqliteSnapshotProvider {
    fn active_orders(&self, restaurant_id: i64) -> Result<Vec<Order>, SnapshotError> {
        let conn = self.db.lock().map_err(|e| format!("DB lock error: {}", e))?;

        let sql = format!(
            "{} WHERE o.restaurant_id = ?1 \
             AND o.status IN ('pending', 'preparing', 'out_for_delivery') \
             ORDER BY o.created_at DESC, o.id DESC",
            ORDER_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut orders: Vec<Order> = stmt
            .query_map([restaurant_id], order_from_row)?
            .collect::<Result<_, _>>()?;

        for order in &mut orders {
            order.items = items_for_order(&conn, order.id)?;
        }

        Ok(orders)
    }

    fn order_detail(&self, order_id: i64) -> Result<Option<Order>, SnapshotError> {
        let conn = self.db.lock().map_err(|e| format!("DB lock error: {}", e))?;

        let sql = format!("{} WHERE o.id = ?1", ORDER_SELECT);
        let order = conn
            .query_row(&sql, [order_id], order_from_row)
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        match order {
            Some(mut order) => {
                order.items = items_for_order(&conn, order.id)?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }
}

/// Map one joined order row. Items are filled in by a second query.
fn order_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Order> {
    let status_text: String = row.get(1)?;
    let status = OrderStatus::from_str(&status_text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown order status: {}", status_text).into(),
        )
    })?;

    Ok(Order {
        id: row.get(0)?,
        status,
        total: row.get(2)?,
        delivery_fee: row.get(3)?,
        address: row.get(4)?,
        created_at: row.get(5)?,
        customer: CustomerRef {
            id: row.get(6)?,
            name: row.get(7)?,
            phone: row.get(8)?,
        },
        restaurant: RestaurantRef {
            id: row.get(9)?,
            name: row.get(10)?,
        },
        items: Vec::new(),
    })
}

fn items_for_order(conn: &Connection, order_id: i64) -> rusqlite::Result<Vec<OrderItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, quantity, unit_price FROM order_items WHERE order_id = ?1 ORDER BY id",
    )?;
    let items = stmt
        .query_map([order_id], |row| {
            Ok(OrderItem {
                id: row.get(0)?,
                name: row.get(1)?,
                quantity: row.get(2)?,
                unit_price: row.get(3)?,
            })
        })?
        .collect();
    items
}
