use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::AuthErrorCode;
use crate::models::AdminUser;

pub const ACCESS_TOKEN_MINUTES: i64 = 15;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub role: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn for_user(user: &AdminUser) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id,
            role: user.role.clone(),
            name: user.name.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(ACCESS_TOKEN_MINUTES)).timestamp(),
        }
    }
}

pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("JWT encode failed: {e}"))
}

/// Expired tokens are told apart from forged or garbled ones so the UI can say which.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AuthErrorCode> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthErrorCode::TokenExpired,
        _ => AuthErrorCode::InvalidToken,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-unit-test-secret";

    fn user() -> AdminUser {
        AdminUser {
            id: Uuid::now_v7(),
            email: "office@parish.org".to_string(),
            password_hash: String::new(),
            name: "Office".to_string(),
            role: "staff".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn round_trip_keeps_identity_and_role() {
        let u = user();
        let token = encode_token(&Claims::for_user(&u), SECRET).unwrap();
        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, u.id);
        assert_eq!(claims.role, "staff");
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = encode_token(&Claims::for_user(&user()), SECRET).unwrap();
        let err = decode_token(&token, "another-secret-another-secret-xx").unwrap_err();
        assert_eq!(err, AuthErrorCode::InvalidToken);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let mut claims = Claims::for_user(&user());
        claims.exp = (Utc::now() - Duration::hours(1)).timestamp();
        let token = encode_token(&claims, SECRET).unwrap();
        assert_eq!(decode_token(&token, SECRET).unwrap_err(), AuthErrorCode::TokenExpired);
    }
}
