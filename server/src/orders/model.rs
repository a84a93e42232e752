use serde::{Deserialize, Serialize};

use crate::orders::status::OrderStatus;

/// Order as carried in push payloads and REST responses.
///
/// The realtime layer never mutates this shape, only forwards it; push and
/// poll return the same shape so the client can reconcile them without a
/// translation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub status: OrderStatus,
    pub total: f64,
    pub created_at: String,
    pub customer: CustomerRef,
    pub restaurant: RestaurantRef,
    pub items: Vec<OrderItem>,
    pub delivery_fee: f64,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRef {
    pub id: i64,
    pub name: String,
    /// May be empty when the account has no phone on file.
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
    pub unit_price: f64,
}
