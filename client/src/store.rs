//! Local order list.
//!
//! Three mutation paths, one per frame kind: wholesale replacement
//! (`pedidos` snapshots and REST polls), merge-by-id (`order-update`),
//! and prepend (`new-order`).

use serde_json::Value;

use crate::normalize::{merge_order, normalize_order, LocalOrder};

/// The client's local view of its order list.
#[derive(Debug, Default)]
pub struct OrderStore {
    orders: Vec<LocalOrder>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire list with a normalized snapshot.
    /// Entries without a usable id are dropped.
    pub fn replace_all(&mut self, raw_orders: &[Value]) {
        self.orders = raw_orders.iter().filter_map(normalize_order).collect();
    }

    /// Merge an `order-update` payload into the order with the given id.
    /// Orders not present locally are ignored, not inserted: the poll or
    /// the next snapshot is the authority on list membership.
    pub fn apply_update(&mut self, order_id: i64, raw: &Value) {
        match self.orders.iter_mut().find(|o| o.id == order_id) {
            Some(existing) => merge_order(existing, raw),
            None => {
                tracing::debug!(order_id, "Update for unknown order ignored");
            }
        }
    }

    /// Prepend a newly created order.
    pub fn prepend(&mut self, raw: &Value) {
        if let Some(order) = normalize_order(raw) {
            self.orders.insert(0, order);
        }
    }

    pub fn orders(&self) -> &[LocalOrder] {
        &self.orders
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> Vec<Value> {
        vec![
            json!({
                "id": 1,
                "status": "pending",
                "total": 30.0,
                "createdAt": "2026-08-01T12:00:00Z",
                "customer": {"id": 9, "name": "Ana", "phone": "11 98888-0000"},
                "restaurant": {"id": 2, "name": "Cantina"},
                "items": [{"id": 1, "name": "Marmita", "quantity": 1, "unitPrice": 25.0}],
                "deliveryFee": 5.0,
                "address": "Rua A 1",
            }),
            json!({
                "id": 2,
                "status": "preparing",
                "total": 18.0,
                "customer": {"id": 9, "name": "Ana"},
                "restaurant": {"id": 2, "name": "Cantina"},
            }),
        ]
    }

    #[test]
    fn replace_all_normalizes_the_snapshot() {
        let mut store = OrderStore::new();
        store.replace_all(&snapshot());

        assert_eq!(store.len(), 2);
        assert_eq!(store.orders()[0].customer.phone, "11 98888-0000");
        // Second order had no phone in the payload
        assert_eq!(store.orders()[1].customer.phone, "");
    }

    #[test]
    fn update_merges_pushed_fields_and_keeps_the_rest() {
        let mut store = OrderStore::new();
        store.replace_all(&snapshot());

        store.apply_update(1, &json!({"status": "preparing"}));

        let order = &store.orders()[0];
        assert_eq!(order.status, "preparing");
        // Fields absent from the partial push are unchanged
        assert_eq!(order.total, 30.0);
        assert_eq!(order.address, "Rua A 1");
        assert_eq!(order.items.len(), 1);
    }

    #[test]
    fn update_is_idempotent() {
        let mut store = OrderStore::new();
        store.replace_all(&snapshot());

        let update = json!({"status": "out_for_delivery", "total": 31.0});
        store.apply_update(1, &update);
        let once: Vec<_> = store.orders().to_vec();
        store.apply_update(1, &update);

        assert_eq!(store.orders(), &once[..]);
    }

    #[test]
    fn update_for_unknown_order_is_ignored() {
        let mut store = OrderStore::new();
        store.replace_all(&snapshot());

        store.apply_update(999, &json!({"status": "delivered"}));

        assert_eq!(store.len(), 2, "Unknown ids must not be inserted");
    }

    #[test]
    fn prepend_puts_the_new_order_first() {
        let mut store = OrderStore::new();
        store.replace_all(&snapshot());

        store.prepend(&json!({
            "id": 3,
            "status": "pending",
            "customer": {"id": 10, "name": "Bia"},
            "restaurant": {"id": 2, "name": "Cantina"},
        }));

        assert_eq!(store.len(), 3);
        assert_eq!(store.orders()[0].id, 3);
    }

    #[test]
    fn prepend_without_id_is_dropped() {
        let mut store = OrderStore::new();
        store.prepend(&json!({"status": "pending"}));
        assert!(store.is_empty());
    }
}
