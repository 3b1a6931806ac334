use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::auth::extractor::{AuthUser, ACCESS_COOKIE, REFRESH_COOKIE};
use crate::auth::jwt::{encode_token, Claims, ACCESS_TOKEN_MINUTES};
use crate::auth::{password, AuthErrorCode};
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{AdminUser, Role};
use crate::state::SharedState;

const REFRESH_TOKEN_DAYS: i64 = 7;
const RESET_TOKEN_HOURS: i64 = 1;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: AdminUser,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn auth_cookies(access_token: &str, refresh_token: &str, secure: bool) -> CookieJar {
    let access = Cookie::build((ACCESS_COOKIE, access_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(ACCESS_TOKEN_MINUTES))
        .build();

    let refresh = Cookie::build((REFRESH_COOKIE, refresh_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(REFRESH_TOKEN_DAYS))
        .build();

    CookieJar::new().add(access).add(refresh)
}

fn clear_auth_cookies() -> CookieJar {
    let access = Cookie::build((ACCESS_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    let refresh = Cookie::build((REFRESH_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(access).add(refresh)
}

pub(crate) fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub(crate) fn check_email(email: &str) -> Result<(), AuthErrorCode> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AuthErrorCode::InvalidEmail),
    }
}

/// Mint an access token and a fresh refresh token for `user`, persisting the latter's hash.
pub(crate) async fn issue_session(
    state: &SharedState,
    user: AdminUser,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let access_token =
        encode_token(&Claims::for_user(&user), &state.config.jwt_secret).map_err(AppError::Internal)?;

    let refresh = generate_token();
    db::refresh_tokens::create(
        &state.pool,
        user.id,
        &hash_token(&refresh),
        Utc::now() + Duration::days(REFRESH_TOKEN_DAYS),
    )
    .await?;

    let jar = auth_cookies(&access_token, &refresh, state.config.secure_cookies);
    Ok((
        jar,
        Json(AuthResponse {
            access_token,
            refresh_token: refresh,
            user,
        }),
    ))
}

/// Verify credentials against the login limiter. Shared by the JSON API and the HTML
/// sign-in form.
pub(crate) async fn authenticate(
    state: &SharedState,
    email: &str,
    candidate: &str,
) -> Result<AdminUser, AppError> {
    state
        .login_limiter
        .check(email)
        .map_err(|_| AuthErrorCode::TooManyRequests)?;

    let Some(user) = db::users::find_by_email(&state.pool, email.trim()).await? else {
        tracing::debug!("Sign-in for unknown account {email}");
        state.login_limiter.record_failure(email);
        return Err(AuthErrorCode::InvalidCredential.into());
    };

    let valid = password::verify(candidate, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        state.login_limiter.record_failure(email);
        return Err(AuthErrorCode::InvalidCredential.into());
    }

    state.login_limiter.record_success(email);
    Ok(user)
}

/// Bootstrap: the very first account may register itself and becomes an admin.
pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    check_email(&req.email)?;
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    password::check_strength(&req.password)?;

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    // Advisory lock prevents concurrent bootstrap registrations
    let mut tx = state.pool.begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock(1)")
        .execute(&mut *tx)
        .await?;

    if db::users::count_all(&mut *tx).await? > 0 {
        return Err(AuthErrorCode::RegistrationClosed.into());
    }

    let user = db::users::create(
        &mut *tx,
        req.email.trim(),
        &pw_hash,
        req.name.trim(),
        Role::Admin.as_str(),
    )
    .await?;

    tx.commit().await?;

    tracing::info!("Bootstrap administrator {} registered", user.email);
    audit::log_event(&state.pool, Some(user.id), "user.registered", "user", Some(user.id), None).await;

    issue_session(&state, user).await
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let user = authenticate(&state, &req.email, &req.password).await?;

    audit::log_event(&state.pool, Some(user.id), "user.login", "user", Some(user.id), None).await;

    issue_session(&state, user).await
}

/// Spend a refresh token and issue a new session. A token presented twice revokes
/// every session of its owner.
pub(crate) async fn rotate_refresh(
    state: &SharedState,
    refresh_value: &str,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let stored = db::refresh_tokens::find_by_hash(&state.pool, &hash_token(refresh_value))
        .await?
        .ok_or(AuthErrorCode::InvalidToken)?;

    if stored.used || !db::refresh_tokens::mark_used(&state.pool, stored.id).await? {
        let revoked = db::refresh_tokens::revoke_all_for_user(&state.pool, stored.user_id).await?;
        tracing::warn!(
            "Refresh token reuse detected for user {}. Revoked {revoked} session(s).",
            stored.user_id
        );
        return Err(AuthErrorCode::TokenReused.into());
    }

    if stored.expires_at < Utc::now() {
        return Err(AuthErrorCode::TokenExpired.into());
    }

    let user = db::users::find_by_id(&state.pool, stored.user_id)
        .await?
        .ok_or(AuthErrorCode::InvalidToken)?;

    issue_session(state, user).await
}

pub async fn refresh(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let refresh_value = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AuthErrorCode::MissingToken)?;

    rotate_refresh(&state, &refresh_value).await
}

/// Revoke the presented refresh token and hand back a jar that clears both cookies.
pub(crate) async fn end_session(state: &SharedState, jar: &CookieJar) -> Result<CookieJar, AppError> {
    if let Some(cookie) = jar.get(REFRESH_COOKIE) {
        db::refresh_tokens::revoke_by_hash(&state.pool, &hash_token(cookie.value())).await?;
    }
    Ok(clear_auth_cookies())
}

pub async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    let jar = end_session(&state, &jar).await?;
    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

pub(crate) const RESET_REQUESTED: &str = "If that email is registered, a reset link has been sent.";

/// Mint a one-hour reset token and mail the link. Runs in the background so response
/// timing does not reveal which addresses have accounts.
pub(crate) fn start_password_reset(state: &SharedState, email: &str) {
    let pool = state.pool.clone();
    let mailer = state.system_mailer.clone();
    let base_url = state.config.base_url.clone();
    let email = email.trim().to_string();

    tokio::spawn(async move {
        let user = match db::users::find_by_email(&pool, &email).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                tracing::error!("Password reset lookup failed: {e}");
                return;
            }
        };

        let token = generate_token();
        if let Err(e) = db::password_reset_tokens::create(
            &pool,
            user.id,
            &hash_token(&token),
            Utc::now() + Duration::hours(RESET_TOKEN_HOURS),
        )
        .await
        {
            tracing::error!("Failed to store password reset token: {e}");
            return;
        }

        let reset_url = format!("{base_url}/admin/reset-password?token={token}");
        match mailer {
            Some(mailer) => {
                if let Err(e) = mailer.send_password_reset(&user.email, &reset_url).await {
                    tracing::error!("Failed to send password reset email: {e}");
                }
            }
            None => tracing::warn!("System SMTP not configured. Password reset link: {reset_url}"),
        }
    });
}

/// Burn the token, set the new password and sign the account out everywhere.
pub(crate) async fn complete_password_reset(
    state: &SharedState,
    token: &str,
    new_password: &str,
) -> Result<(), AppError> {
    password::check_strength(new_password)?;

    let user_id = db::password_reset_tokens::consume(&state.pool, &hash_token(token))
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

    let pw_hash = password::hash(new_password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, user_id, &pw_hash).await?;

    db::refresh_tokens::revoke_all_for_user(&state.pool, user_id).await?;
    db::password_reset_tokens::delete_for_user(&state.pool, user_id).await?;

    audit::log_event(&state.pool, Some(user_id), "user.password_reset", "user", Some(user_id), None).await;
    Ok(())
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Json<MessageResponse> {
    start_password_reset(&state, &req.email);
    Json(MessageResponse {
        message: RESET_REQUESTED.to_string(),
    })
}

pub async fn reset_password(
    State(state): State<SharedState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    complete_password_reset(&state, &req.token, &req.password).await?;
    Ok(Json(MessageResponse {
        message: "Password reset successfully".to_string(),
    }))
}

pub async fn change_password(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    password::check_strength(&req.new_password)?;

    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AuthErrorCode::InvalidToken)?;

    let valid =
        password::verify(&req.current_password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        return Err(AppError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, user.id, &pw_hash).await?;

    // Every other device signs in again
    db::refresh_tokens::revoke_all_for_user(&state.pool, user.id).await?;

    audit::log_event(
        &state.pool,
        Some(user.id),
        "user.password_changed",
        "user",
        Some(user.id),
        None,
    )
    .await;

    issue_session(&state, user).await
}
