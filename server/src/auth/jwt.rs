use std::path::Path;

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;

use crate::auth::middleware::Claims;
use crate::auth::Role;

/// Load or generate the JWT signing key (256-bit random secret).
/// Key is stored as raw bytes in data_dir/jwt_secret.
/// The key MUST be cryptographically random, never human-readable.
pub fn load_or_generate_jwt_secret(data_dir: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let key_path = Path::new(data_dir).join("jwt_secret");

    if key_path.exists() {
        let key = std::fs::read(&key_path)?;
        if key.len() == 32 {
            tracing::info!("JWT signing key loaded from {}", key_path.display());
            return Ok(key);
        }
        // Invalid key file — regenerate
        tracing::warn!("JWT key file has wrong size ({}), regenerating", key.len());
    }

    // Generate new 256-bit random key
    let key: [u8; 32] = rand::rng().random();
    std::fs::write(&key_path, key)?;
    tracing::info!("JWT signing key generated at {}", key_path.display());
    Ok(key.to_vec())
}

/// Issue an access token (1-hour expiry).
/// Claims: sub=user_id, role, name, email, iat, exp
pub fn issue_access_token(
    secret: &[u8],
    user_id: i64,
    role: Role,
    name: &str,
    email: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        role,
        name: name.to_string(),
        email: email.to_string(),
        iat: now,
        exp: now + 3600, // 1 hour
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(secret),
    )
}

/// Validate an access token and return its claims.
/// Used by both the REST Claims extractor and the WebSocket handshake
/// (where the token arrives as a query parameter, since browser
/// WebSocket clients cannot set headers during the handshake).
pub fn validate_access_token(
    secret: &[u8],
    token: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_validate_roundtrips_claims() {
        let secret = [7u8; 32];
        let token =
            issue_access_token(&secret, 42, Role::Lojista, "Marmitas da Vó", "vo@example.com")
                .unwrap();
        let claims = validate_access_token(&secret, &token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Lojista);
        assert_eq!(claims.name, "Marmitas da Vó");
    }

    #[test]
    fn validate_rejects_wrong_secret() {
        let token =
            issue_access_token(&[1u8; 32], 1, Role::Cliente, "Ana", "ana@example.com").unwrap();
        assert!(validate_access_token(&[2u8; 32], &token).is_err());
    }

    #[test]
    fn validate_rejects_garbage() {
        assert!(validate_access_token(&[1u8; 32], "not-a-jwt").is_err());
    }
}
