// src/services/auth.rs
// DOCUMENTATION: Password hashing and JWT issuance/verification
// PURPOSE: All credential handling for the API

use crate::config::Config;
use crate::errors::FindamError;
use crate::models::{TokenPairResponse, User};
use actix_web::HttpRequest;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token kinds carried in the claims
pub mod token_kind {
    pub const ACCESS: &str = "access";
    pub const REFRESH: &str = "refresh";
}

/// JWT claims for both access and refresh tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub email: String,
    pub user_type: String,
    /// "access" or "refresh"
    pub kind: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.user_type == "admin"
    }

    pub fn is_owner(&self) -> bool {
        self.user_type == "owner"
    }
}

/// Hash a password into an Argon2id PHC string
pub fn hash_password(password: &str) -> Result<String, FindamError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            log::error!("Password hashing failed: {}", e);
            FindamError::InternalError
        })?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, FindamError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        log::error!("Stored password hash is invalid: {}", e);
        FindamError::InternalError
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Issue an access/refresh token pair for a user
pub fn generate_token_pair(config: &Config, user: &User) -> Result<TokenPairResponse, FindamError> {
    let access_token = generate_token(config, user, token_kind::ACCESS, config.jwt_access_ttl)?;
    let refresh_token = generate_token(config, user, token_kind::REFRESH, config.jwt_refresh_ttl)?;

    Ok(TokenPairResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: config.jwt_access_ttl,
    })
}

fn generate_token(
    config: &Config,
    user: &User,
    kind: &str,
    ttl_seconds: i64,
) -> Result<String, FindamError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        user_type: user.user_type.clone(),
        kind: kind.to_string(),
        iat: now,
        exp: now + ttl_seconds,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        log::error!("Token encoding failed: {}", e);
        FindamError::InternalError
    })
}

/// Decode and validate a token of the expected kind
pub fn decode_token(
    config: &Config,
    token: &str,
    expected_kind: &str,
) -> Result<Claims, FindamError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        log::debug!("Token rejected: {}", e);
        FindamError::Unauthorized
    })?;

    if data.claims.kind != expected_kind {
        log::warn!(
            "Token of kind '{}' used where '{}' expected",
            data.claims.kind,
            expected_kind
        );
        return Err(FindamError::Unauthorized);
    }

    Ok(data.claims)
}

/// Extract and validate the bearer token of a request
/// DOCUMENTATION: Checks the Authorization header against the configured
/// secret; every protected handler starts with this call
pub fn authenticate(req: &HttpRequest, config: &Config) -> Result<Claims, FindamError> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            log::debug!("Request without Authorization header");
            FindamError::Unauthorized
        })?;

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        log::debug!("Authorization header without Bearer prefix");
        FindamError::Unauthorized
    })?;

    decode_token(config, token, token_kind::ACCESS)
}

/// Guard for admin-only endpoints
pub fn require_admin(claims: &Claims) -> Result<(), FindamError> {
    if !claims.is_admin() {
        log::warn!("User {} attempted an admin action", claims.sub);
        return Err(FindamError::Forbidden);
    }
    Ok(())
}

/// Guard for endpoints reserved to owners (admins pass too)
pub fn require_owner(claims: &Claims) -> Result<(), FindamError> {
    if !claims.is_owner() && !claims.is_admin() {
        log::warn!("User {} attempted an owner action", claims.sub);
        return Err(FindamError::Forbidden);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_config() -> Config {
        let mut config = Config::from_env();
        config.jwt_secret = "test-secret".to_string();
        config.jwt_access_ttl = 3600;
        config.jwt_refresh_ttl = 7200;
        config
    }

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "tenant@example.cm".to_string(),
            phone_number: "237650000001".to_string(),
            first_name: "Aline".to_string(),
            last_name: "Mbarga".to_string(),
            user_type: "tenant".to_string(),
            password_hash: String::new(),
            is_active: true,
            is_verified: false,
            date_joined: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn test_token_roundtrip() {
        let config = test_config();
        let user = test_user();

        let pair = generate_token_pair(&config, &user).unwrap();
        let claims = decode_token(&config, &pair.access_token, token_kind::ACCESS).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.user_type, "tenant");
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let config = test_config();
        let user = test_user();

        let pair = generate_token_pair(&config, &user).unwrap();
        assert!(decode_token(&config, &pair.refresh_token, token_kind::ACCESS).is_err());
        assert!(decode_token(&config, &pair.refresh_token, token_kind::REFRESH).is_ok());
    }

    #[test]
    fn test_role_guards() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "owner@example.cm".to_string(),
            user_type: "owner".to_string(),
            kind: token_kind::ACCESS.to_string(),
            iat: now,
            exp: now + 3600,
        };

        assert!(require_owner(&claims).is_ok());
        assert!(require_admin(&claims).is_err());
    }
}
