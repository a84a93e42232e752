pub mod jwt;
pub mod middleware;

use serde::{Deserialize, Serialize};

/// Account role carried in the access token.
/// `Lojista` is a merchant (restaurant owner), `Cliente` a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Lojista,
    Cliente,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Lojista => "lojista",
            Self::Cliente => "cliente",
        }
    }
}
