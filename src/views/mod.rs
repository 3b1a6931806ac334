pub mod auth;
pub mod dashboard;
pub mod public;
pub mod submissions;

use askama::Template;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;

use crate::error::AppError;
use crate::state::SharedState;

pub(crate) fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    template
        .render()
        .map(Html)
        .map_err(|e| AppError::Internal(format!("Template render failed: {e}")))
}

/// Pages anyone can open: the form index and the wizards.
pub fn public_views() -> Router<SharedState> {
    Router::new()
        .route("/", get(public::home))
        .route("/forms/{kind}", get(public::form).post(public::submit))
}

/// Sign-in pages. These must stay reachable without a session.
pub fn auth_views() -> Router<SharedState> {
    Router::new()
        .route("/admin/login", get(auth::login_page).post(auth::login))
        .route("/admin/logout", post(auth::logout))
        .route(
            "/admin/forgot-password",
            get(auth::forgot_password_page).post(auth::forgot_password),
        )
        .route(
            "/admin/reset-password",
            get(auth::reset_password_page).post(auth::reset_password),
        )
}

/// Dashboard pages. Wrapped in the sign-in redirect by the app builder.
pub fn admin_views() -> Router<SharedState> {
    Router::new()
        .route("/admin", get(dashboard::index))
        .route("/admin/collections/{collection}", get(submissions::list))
        .route("/admin/submissions/{id}", get(submissions::detail))
        .route("/admin/submissions/{id}/print", get(submissions::print))
        .route("/admin/submissions/{id}/status", post(submissions::update_status))
        .route("/admin/submissions/{id}/notes", post(submissions::update_notes))
        .route("/admin/submissions/{id}/delete", post(submissions::delete))
}
