//! Normalization of pushed order payloads.
//!
//! Optional nested fields (customer phone, timestamps, items) are pinned to
//! stable defaults here so rendering code downstream never branches on
//! missing values.

use serde_json::Value;

/// Order as held locally after normalization. Every field has a value.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalOrder {
    pub id: i64,
    pub status: String,
    pub total: f64,
    pub created_at: String,
    pub customer: LocalCustomer,
    pub restaurant: LocalRestaurant,
    pub items: Vec<LocalItem>,
    pub delivery_fee: f64,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalCustomer {
    pub id: i64,
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalRestaurant {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalItem {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
    pub unit_price: f64,
}

fn str_or_empty(value: &Value, key: &str) -> String {
    value[key].as_str().unwrap_or_default().to_string()
}

fn f64_or_zero(value: &Value, key: &str) -> f64 {
    value[key].as_f64().unwrap_or_default()
}

/// Build a fully-defaulted local order from a raw payload.
/// Returns None when the payload has no numeric id to key on.
pub fn normalize_order(raw: &Value) -> Option<LocalOrder> {
    let id = raw["id"].as_i64()?;

    let customer = &raw["customer"];
    let restaurant = &raw["restaurant"];

    let items = raw["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| LocalItem {
                    id: item["id"].as_i64().unwrap_or_default(),
                    name: str_or_empty(item, "name"),
                    quantity: item["quantity"].as_i64().unwrap_or_default(),
                    unit_price: f64_or_zero(item, "unitPrice"),
                })
                .collect()
        })
        .unwrap_or_default();

    Some(LocalOrder {
        id,
        status: str_or_empty(raw, "status"),
        total: f64_or_zero(raw, "total"),
        created_at: str_or_empty(raw, "createdAt"),
        customer: LocalCustomer {
            id: customer["id"].as_i64().unwrap_or_default(),
            name: str_or_empty(customer, "name"),
            phone: str_or_empty(customer, "phone"),
        },
        restaurant: LocalRestaurant {
            id: restaurant["id"].as_i64().unwrap_or_default(),
            name: str_or_empty(restaurant, "name"),
        },
        items,
        delivery_fee: f64_or_zero(raw, "deliveryFee"),
        address: str_or_empty(raw, "address"),
    })
}

/// Merge the fields present in `raw` into an existing local order.
/// Fields absent from the payload keep their current local value, so a
/// partial push never erases known state.
pub fn merge_order(existing: &mut LocalOrder, raw: &Value) {
    if let Some(status) = raw["status"].as_str() {
        existing.status = status.to_string();
    }
    if let Some(total) = raw["total"].as_f64() {
        existing.total = total;
    }
    if let Some(created_at) = raw["createdAt"].as_str() {
        existing.created_at = created_at.to_string();
    }
    if let Some(address) = raw["address"].as_str() {
        existing.address = address.to_string();
    }
    if let Some(fee) = raw["deliveryFee"].as_f64() {
        existing.delivery_fee = fee;
    }
    if raw["customer"].is_object() {
        let customer = &raw["customer"];
        if let Some(id) = customer["id"].as_i64() {
            existing.customer.id = id;
        }
        if let Some(name) = customer["name"].as_str() {
            existing.customer.name = name.to_string();
        }
        if let Some(phone) = customer["phone"].as_str() {
            existing.customer.phone = phone.to_string();
        }
    }
    if raw["restaurant"].is_object() {
        let restaurant = &raw["restaurant"];
        if let Some(id) = restaurant["id"].as_i64() {
            existing.restaurant.id = id;
        }
        if let Some(name) = restaurant["name"].as_str() {
            existing.restaurant.name = name.to_string();
        }
    }
    if raw["items"].is_array() {
        if let Some(updated) = normalize_order(&serde_json::json!({
            "id": existing.id,
            "items": raw["items"],
        })) {
            existing.items = updated.items;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_optional_fields_get_stable_defaults() {
        let raw = json!({
            "id": 3,
            "status": "pending",
            "customer": {"id": 9, "name": "Ana"},
        });
        let order = normalize_order(&raw).unwrap();
        assert_eq!(order.customer.phone, "");
        assert_eq!(order.created_at, "");
        assert_eq!(order.address, "");
        assert!(order.items.is_empty());
        assert_eq!(order.delivery_fee, 0.0);
    }

    #[test]
    fn payload_without_id_is_rejected() {
        assert!(normalize_order(&json!({"status": "pending"})).is_none());
    }

    #[test]
    fn merge_keeps_fields_absent_from_the_push() {
        let mut order = normalize_order(&json!({
            "id": 3,
            "status": "pending",
            "address": "Rua A 1",
            "customer": {"id": 9, "name": "Ana", "phone": "11 98888-0000"},
        }))
        .unwrap();

        merge_order(&mut order, &json!({"status": "preparing"}));

        assert_eq!(order.status, "preparing");
        assert_eq!(order.address, "Rua A 1");
        assert_eq!(order.customer.phone, "11 98888-0000");
    }
}
