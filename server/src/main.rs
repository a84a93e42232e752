use std::sync::Arc;

use tokio::net::TcpListener;

use entrega_server::auth;
use entrega_server::config::{generate_config_template, Config};
use entrega_server::db;
use entrega_server::routes;
use entrega_server::state;
use entrega_server::ws;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load()?;

    // Handle --generate-config: print template and exit
    if config.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Initialize tracing/logging
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "entrega_server=info".parse().unwrap()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "entrega_server=info".parse().unwrap()),
            )
            .init();
    }

    tracing::info!("entrega gateway v{} starting", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite database
    let db = db::init_db(&config.data_dir)?;

    // JWT signing secret: an explicit config value wins, otherwise a
    // 256-bit random key stored in data_dir (generated on first boot).
    let jwt_secret = match &config.jwt_secret {
        Some(hex_key) => hex::decode(hex_key)?,
        None => auth::jwt::load_or_generate_jwt_secret(&config.data_dir)?,
    };

    // Build application state. The connection registry is constructed
    // exactly once here and shared by handle through AppState.
    let app_state = state::AppState {
        db,
        jwt_secret,
        connections: Arc::new(ws::ConnectionRegistry::new()),
    };

    let app = routes::build_router(app_state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
