pub mod admin;
pub mod attachments;
pub mod auth;
pub mod public;
pub mod submissions;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/forgot-password", post(auth::forgot_password))
        .route("/api/v1/auth/reset-password", post(auth::reset_password))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        // Submissions
        .route("/api/v1/submissions", get(submissions::list))
        .route("/api/v1/submissions/export", get(submissions::export))
        .route(
            "/api/v1/submissions/{id}",
            get(submissions::get).delete(submissions::delete),
        )
        .route("/api/v1/submissions/{id}/status", put(submissions::update_status))
        .route("/api/v1/submissions/{id}/notes", put(submissions::update_notes))
        .route("/api/v1/attachments/{id}", get(attachments::download))
        .route("/api/v1/stats", get(submissions::stats))
        // Admin
        .route(
            "/api/v1/admin/users",
            get(admin::list_users).post(admin::create_user),
        )
        .route("/api/v1/admin/users/{id}", delete(admin::delete_user))
        .route("/api/v1/admin/audit", get(admin::audit_log))
}

/// Unauthenticated endpoints behind the public forms.
pub fn public_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/v1/forms", get(public::list_forms))
        .route(
            "/api/v1/forms/{kind}",
            get(public::get_form).post(public::submit),
        )
        .route("/api/v1/forms/{kind}/steps/{step}", post(public::validate_step))
}
