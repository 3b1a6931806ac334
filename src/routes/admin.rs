use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::{password, AuthErrorCode};
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{AdminUser, AuditEvent, Role};
use crate::routes::auth::check_email;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct AuditParams {
    pub resource_id: Option<Uuid>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn list_users(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<AdminUser>>, AppError> {
    auth.require_admin()?;
    let users = db::users::list_all(&state.pool).await?;
    Ok(Json(users))
}

pub async fn create_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateUser>,
) -> Result<Json<AdminUser>, AppError> {
    auth.require_admin()?;

    check_email(&req.email)?;
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    password::check_strength(&req.password)?;
    let role = match req.role.as_deref() {
        None => Role::Staff,
        Some(r) => Role::parse(r).ok_or_else(|| AppError::BadRequest(format!("Unknown role: {r}")))?,
    };

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let user = db::users::create(
        &state.pool,
        req.email.trim(),
        &pw_hash,
        req.name.trim(),
        role.as_str(),
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Auth(AuthErrorCode::EmailInUse)
        }
        _ => AppError::Database(e),
    })?;

    if let Some(mailer) = state.system_mailer.clone() {
        let (email, name, base_url) = (user.email.clone(), user.name.clone(), state.config.base_url.clone());
        tokio::spawn(async move {
            if let Err(e) = mailer.send_welcome(&email, &name, &base_url).await {
                tracing::error!("Failed to send welcome email to {email}: {e}");
            }
        });
    }

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "user.created",
        "user",
        Some(user.id),
        Some(serde_json::json!({ "role": user.role })),
    )
    .await;

    Ok(Json(user))
}

pub async fn delete_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    if id == auth.user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    let target = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if target.role == Role::Admin.as_str() && db::users::count_admins(&state.pool).await? <= 1 {
        return Err(AppError::Conflict(
            "The last administrator cannot be deleted".to_string(),
        ));
    }

    db::users::delete(&state.pool, id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        "user.deleted",
        "user",
        Some(id),
        Some(serde_json::json!({ "email": target.email })),
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

pub async fn audit_log(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<AuditParams>,
) -> Result<Json<Vec<AuditEvent>>, AppError> {
    auth.require_admin()?;

    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(50).clamp(1, 200);
    let events =
        db::audit::list(&state.pool, params.resource_id, per_page, (page - 1) * per_page).await?;
    Ok(Json(events))
}
