use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// entrega realtime gateway
#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(name = "entrega-server", version, about = "entrega order-delivery realtime gateway")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "ENTREGA_PORT", default_value = "3333")]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "ENTREGA_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Path to TOML config file
    #[arg(long, default_value = "./entrega.toml")]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "ENTREGA_JSON_LOGS")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Data directory for persistent state (DB, signing key)
    #[arg(long, env = "ENTREGA_DATA_DIR", default_value = "./data")]
    pub data_dir: String,

    /// JWT signing secret as hex (overrides the key file in data_dir)
    #[arg(long, env = "ENTREGA_JWT_SECRET")]
    pub jwt_secret: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3333,
            bind_address: "0.0.0.0".to_string(),
            config: "./entrega.toml".to_string(),
            json_logs: false,
            generate_config: false,
            data_dir: "./data".to_string(),
            jwt_secret: None,
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (ENTREGA_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("ENTREGA_"))
            .merge(Serialized::defaults(cli))
            .extract()
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# entrega Realtime Gateway Configuration
# Place this file at ./entrega.toml or specify with --config <path>
# All settings can be overridden via environment variables (ENTREGA_PORT, etc.)
# or CLI flags (--port, etc.)

# Gateway port (default: 3333)
# port = 3333

# Bind address (default: 0.0.0.0 — all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# Data directory for SQLite database and JWT signing key
# data_dir = "./data"

# JWT signing secret as hex. When unset, a random 256-bit key is
# generated on first boot and stored at <data_dir>/jwt_secret.
# Must match the secret used by the HTTP API that issues tokens.
# jwt_secret = ""
"#
    .to_string()
}
