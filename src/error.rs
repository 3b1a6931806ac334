use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::auth::AuthErrorCode;
use crate::forms::FieldError;
use crate::middleware::auth_redirect::AUTH_CODE_HEADER;
use crate::storage::StorageError;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Forbidden(String),
    BadRequest(String),
    Conflict(String),
    RateLimited(u64),
    Validation(Vec<FieldError>),
    Auth(AuthErrorCode),
    Internal(String),
    Database(sqlx::Error),
    Storage(StorageError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            AppError::RateLimited(secs) => write!(f, "Rate Limited: retry after {secs}s"),
            AppError::Validation(errors) => write!(f, "Validation failed: {} field(s)", errors.len()),
            AppError::Auth(code) => write!(f, "Auth: {}", code.code()),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            AppError::Database(err) => write!(f, "Database Error: {err}"),
            AppError::Storage(err) => write!(f, "Storage Error: {err}"),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Auth(code) => code.status(),
            AppError::Internal(_) | AppError::Database(_) | AppError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::NotFound(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg) => json!({ "error": msg }),
            AppError::RateLimited(secs) => json!({
                "error": "Too many submissions. Please try again shortly.",
                "retry_after": secs,
            }),
            AppError::Validation(errors) => json!({
                "error": "Please correct the highlighted fields.",
                "fields": errors,
            }),
            AppError::Auth(code) => json!({
                "error": code.message(),
                "code": code.code(),
            }),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                json!({ "error": "Internal server error" })
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {err}");
                json!({ "error": "Internal server error" })
            }
            AppError::Storage(err) => {
                tracing::error!("Storage error: {err}");
                json!({ "error": "Internal server error" })
            }
        };

        let mut response = (status, axum::Json(body)).into_response();
        match self {
            AppError::RateLimited(secs) => {
                if let Ok(value) = secs.to_string().parse() {
                    response.headers_mut().insert("retry-after", value);
                }
            }
            AppError::Auth(code) => {
                response.headers_mut().insert(
                    AUTH_CODE_HEADER,
                    HeaderValue::from_static(code.code()),
                );
            }
            _ => {}
        }
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}

impl From<AuthErrorCode> for AppError {
    fn from(code: AuthErrorCode) -> Self {
        AppError::Auth(code)
    }
}
