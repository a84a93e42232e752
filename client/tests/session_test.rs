//! End-to-end tests: a real gateway on an ephemeral port, a ClientSession
//! consuming pushes and polling REST.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio::net::TcpListener;

use entrega_client::{ClientSession, SessionConfig};
use entrega_server::auth::{jwt, Role};
use entrega_server::state::AppState;
use entrega_server::ws::ConnectionRegistry;

async fn start_test_server() -> (SocketAddr, AppState) {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_dir = tmp_dir.path().to_str().unwrap().to_string();

    let db = entrega_server::db::init_db(&data_dir).expect("Failed to init DB");
    let jwt_secret =
        jwt::load_or_generate_jwt_secret(&data_dir).expect("Failed to generate JWT secret");

    let state = AppState {
        db,
        jwt_secret,
        connections: Arc::new(ConnectionRegistry::new()),
    };

    let app = entrega_server::routes::build_router(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
        let _keep = tmp_dir;
    });

    (addr, state)
}

fn seed_user(state: &AppState, name: &str, email: &str, role: Role) -> i64 {
    let conn = state.db.lock().unwrap();
    conn.execute(
        "INSERT INTO users (name, email, phone, role, created_at) VALUES (?1, ?2, NULL, ?3, ?4)",
        rusqlite::params![name, email, role.as_str(), Utc::now().to_rfc3339()],
    )
    .unwrap();
    conn.last_insert_rowid()
}

fn seed_restaurant(state: &AppState, owner_id: i64, name: &str) -> i64 {
    let conn = state.db.lock().unwrap();
    conn.execute(
        "INSERT INTO restaurants (owner_id, name, delivery_fee, created_at) VALUES (?1, ?2, 5.0, ?3)",
        rusqlite::params![owner_id, name, Utc::now().to_rfc3339()],
    )
    .unwrap();
    conn.last_insert_rowid()
}

fn seed_order(state: &AppState, customer_id: i64, restaurant_id: i64, status: &str) -> i64 {
    let conn = state.db.lock().unwrap();
    conn.execute(
        "INSERT INTO orders (customer_id, restaurant_id, status, total, delivery_fee, address, created_at)
         VALUES (?1, ?2, ?3, 42.0, 5.0, 'Rua B 2', ?4)",
        rusqlite::params![customer_id, restaurant_id, status, Utc::now().to_rfc3339()],
    )
    .unwrap();
    conn.last_insert_rowid()
}

fn token_for(state: &AppState, user_id: i64, role: Role, name: &str) -> String {
    jwt::issue_access_token(
        &state.jwt_secret,
        user_id,
        role,
        name,
        &format!("{}@example.com", name.to_lowercase()),
    )
    .unwrap()
}

fn session_config(addr: SocketAddr, token: &str) -> SessionConfig {
    let mut config = SessionConfig::new(
        format!("ws://{}", addr),
        format!("http://{}", addr),
        token,
    );
    // Tight timings for tests; production defaults are 5s / 30s
    config.reconnect_delay = Duration::from_millis(200);
    config.poll_interval = Duration::from_millis(200);
    config
}

/// Poll a predicate against the session until it holds or the deadline hits.
async fn wait_until<F>(session: &ClientSession, deadline: Duration, predicate: F)
where
    F: Fn(&[entrega_client::LocalOrder]) -> bool,
{
    let start = tokio::time::Instant::now();
    loop {
        if predicate(&session.orders()) {
            return;
        }
        assert!(
            start.elapsed() < deadline,
            "Condition not met within {:?}; orders: {:?}",
            deadline,
            session.orders()
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::test]
async fn merchant_session_receives_snapshot_and_updates() {
    let (addr, state) = start_test_server().await;
    let owner = seed_user(&state, "Jorge", "jorge@example.com", Role::Lojista);
    let customer = seed_user(&state, "Ana", "ana@example.com", Role::Cliente);
    let restaurant = seed_restaurant(&state, owner, "Cantina");
    let order_id = seed_order(&state, customer, restaurant, "pending");
    let _done = seed_order(&state, customer, restaurant, "delivered");

    let owner_token = token_for(&state, owner, Role::Lojista, "Jorge");
    let session = ClientSession::spawn(session_config(addr, &owner_token));

    // Snapshot arrives via identify (or first poll): only the active order
    wait_until(&session, Duration::from_secs(3), |orders| {
        orders.len() == 1 && orders[0].id == order_id
    })
    .await;

    // Transition the order; the push must update the local copy
    let resp = reqwest::Client::new()
        .put(format!("http://{}/orders/{}/status", addr, order_id))
        .bearer_auth(&owner_token)
        .json(&json!({"status": "preparing"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    wait_until(&session, Duration::from_secs(3), |orders| {
        orders.iter().any(|o| o.id == order_id && o.status == "preparing")
    })
    .await;

    session.shutdown().await;
}

#[tokio::test]
async fn merchant_session_sees_new_orders_arrive() {
    let (addr, state) = start_test_server().await;
    let owner = seed_user(&state, "Jorge", "jorge@example.com", Role::Lojista);
    let customer = seed_user(&state, "Ana", "ana@example.com", Role::Cliente);
    let restaurant = seed_restaurant(&state, owner, "Cantina");

    let owner_token = token_for(&state, owner, Role::Lojista, "Jorge");
    let customer_token = token_for(&state, customer, Role::Cliente, "Ana");
    let session = ClientSession::spawn(session_config(addr, &owner_token));

    wait_until(&session, Duration::from_secs(3), |orders| orders.is_empty()).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{}/orders", addr))
        .bearer_auth(&customer_token)
        .json(&json!({
            "restaurantId": restaurant,
            "address": "Rua Augusta 500",
            "items": [{"name": "Marmita", "quantity": 1, "unitPrice": 20.0}],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    wait_until(&session, Duration::from_secs(3), |orders| {
        orders.len() == 1 && orders[0].status == "pending" && orders[0].items.len() == 1
    })
    .await;

    session.shutdown().await;
}

#[tokio::test]
async fn customer_session_tracks_status_through_poll_and_push() {
    let (addr, state) = start_test_server().await;
    let owner = seed_user(&state, "Jorge", "jorge@example.com", Role::Lojista);
    let customer = seed_user(&state, "Ana", "ana@example.com", Role::Cliente);
    let restaurant = seed_restaurant(&state, owner, "Cantina");
    let order_id = seed_order(&state, customer, restaurant, "preparing");

    let owner_token = token_for(&state, owner, Role::Lojista, "Jorge");
    let customer_token = token_for(&state, customer, Role::Cliente, "Ana");
    let session = ClientSession::spawn(session_config(addr, &customer_token));

    // Customers get no WS snapshot; the initial list comes from the poll
    wait_until(&session, Duration::from_secs(3), |orders| {
        orders.iter().any(|o| o.id == order_id && o.status == "preparing")
    })
    .await;

    let resp = reqwest::Client::new()
        .put(format!("http://{}/orders/{}/status", addr, order_id))
        .bearer_auth(&owner_token)
        .json(&json!({"status": "out_for_delivery"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    wait_until(&session, Duration::from_secs(3), |orders| {
        orders
            .iter()
            .any(|o| o.id == order_id && o.status == "out_for_delivery")
    })
    .await;

    session.shutdown().await;
}

#[tokio::test]
async fn session_reconnects_after_the_gateway_comes_back() {
    // Reserve an address, then release it so the session starts against a
    // dead port
    let placeholder = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = placeholder.local_addr().unwrap();
    drop(placeholder);

    let tmp_dir = tempfile::tempdir().unwrap();
    let data_dir = tmp_dir.path().to_str().unwrap().to_string();
    let db = entrega_server::db::init_db(&data_dir).unwrap();
    let jwt_secret = jwt::load_or_generate_jwt_secret(&data_dir).unwrap();
    let state = AppState {
        db,
        jwt_secret,
        connections: Arc::new(ConnectionRegistry::new()),
    };

    let owner = seed_user(&state, "Jorge", "jorge@example.com", Role::Lojista);
    let customer = seed_user(&state, "Ana", "ana@example.com", Role::Cliente);
    let restaurant = seed_restaurant(&state, owner, "Cantina");
    let order_id = seed_order(&state, customer, restaurant, "pending");
    let owner_token = token_for(&state, owner, Role::Lojista, "Jorge");

    // Session starts first; every connect and poll fails for now
    let session = ClientSession::spawn(session_config(addr, &owner_token));
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(session.orders().is_empty());

    // Gateway comes up on the same address; the fixed-delay retry finds it
    let listener = TcpListener::bind(addr).await.expect("rebind reserved addr");
    let app = entrega_server::routes::build_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
        let _keep = tmp_dir;
    });

    wait_until(&session, Duration::from_secs(5), |orders| {
        orders.iter().any(|o| o.id == order_id)
    })
    .await;

    session.shutdown().await;
}
