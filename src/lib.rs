pub mod config;
pub mod error;
pub mod state;
pub mod auth;
pub mod db;
pub mod models;
pub mod middleware;
pub mod routes;
pub mod views;
pub mod email;
pub mod forms;
pub mod present;
pub mod review;
pub mod storage;
pub mod submission;
pub mod rate_limit;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use sqlx::PgPool;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::auth_redirect::redirect_unauthorized;

use crate::config::Config;
use crate::email::SystemMailer;
use crate::rate_limit::{LoginRateLimiter, SubmissionRateLimiter};
use crate::state::{AppState, SharedState};
use crate::storage::BlobStore;

pub fn build_state(pool: PgPool, config: Config, storage: Arc<dyn BlobStore>) -> SharedState {
    let system_mailer = config.smtp.as_ref().and_then(|smtp| {
        match SystemMailer::new(smtp, &config.parish_name) {
            Ok(mailer) => {
                tracing::info!("System SMTP configured");
                Some(Arc::new(mailer))
            }
            Err(e) => {
                tracing::warn!("System SMTP not available: {e}");
                None
            }
        }
    });

    if config.office_email.is_none() {
        tracing::info!("PARISH_OFFICE_EMAIL not set; new submissions will not be announced by email");
    }

    Arc::new(AppState {
        pool,
        config,
        storage,
        system_mailer,
        submission_limiter: SubmissionRateLimiter::new(),
        login_limiter: LoginRateLimiter::new(),
    })
}

pub fn build_app(pool: PgPool, config: Config, storage: Arc<dyn BlobStore>) -> Router {
    router(build_state(pool, config, storage))
}

pub fn router(state: SharedState) -> Router {
    let max_body_size = state.config.max_body_size;

    Router::new()
        .merge(routes::api_routes())
        .merge(routes::public_routes())
        .merge(views::public_views())
        .merge(views::auth_views())
        .merge(views::admin_views().layer(axum::middleware::from_fn(redirect_unauthorized)))
        .nest_service("/static", ServeDir::new("static"))
        .route("/health", axum::routing::get(health))
        // Uploads are bounded by the configured body size rather than axum's 2 MB default
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

/// Periodic housekeeping: stale rate-limit windows and expired refresh tokens.
pub fn spawn_cleanup(state: SharedState, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let window = Duration::from_secs(state.config.submission_rate_window_secs);
            let submissions = state.submission_limiter.cleanup(window);
            let logins = state.login_limiter.cleanup(Duration::from_secs(15 * 60));
            match db::refresh_tokens::purge_expired(&state.pool).await {
                Ok(tokens) => tracing::debug!(
                    "Cleanup: {submissions} submission window(s), {logins} login window(s), {tokens} expired token(s)"
                ),
                Err(e) => tracing::error!("Failed to purge expired refresh tokens: {e}"),
            }
        }
    })
}

async fn health() -> &'static str {
    "ok"
}
