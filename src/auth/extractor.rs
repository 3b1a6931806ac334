use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use super::errors::AuthErrorCode;
use super::jwt::{self, Claims};
use crate::error::AppError;
use crate::models::Role;
use crate::state::SharedState;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// A signed-in dashboard user, resolved from a Bearer header or the access cookie.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Deleting records and managing accounts is reserved for admins; staff only review.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Administrator access required".to_string()))
        }
    }

    fn from_claims(claims: Claims) -> Result<Self, AppError> {
        let role = Role::parse(&claims.role).ok_or(AppError::Auth(AuthErrorCode::InvalidToken))?;
        Ok(Self {
            user_id: claims.sub,
            name: claims.name,
            role,
        })
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth_header) = parts.headers.get("authorization") {
            let auth_str = auth_header
                .to_str()
                .map_err(|_| AppError::Auth(AuthErrorCode::InvalidToken))?;

            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                let claims = jwt::decode_token(token, &state.config.jwt_secret)
                    .map_err(AppError::Auth)?;
                return Self::from_claims(claims);
            }
        }

        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(cookie) = jar.get(ACCESS_COOKIE) {
            let claims = jwt::decode_token(cookie.value(), &state.config.jwt_secret)
                .map_err(AppError::Auth)?;
            return Self::from_claims(claims);
        }

        Err(AppError::Auth(AuthErrorCode::MissingToken))
    }
}
