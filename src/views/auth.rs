use askama::Template;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::render;
use crate::auth::errors::message_for;
use crate::auth::extractor::{ACCESS_COOKIE, REFRESH_COOKIE};
use crate::auth::jwt;
use crate::error::AppError;
use crate::middleware::audit;
use crate::routes::auth as session;
use crate::state::SharedState;

const HOME: &str = "/admin";

#[derive(Template)]
#[template(path = "admin/login.html")]
struct LoginTemplate {
    parish_name: String,
    error: Option<&'static str>,
    notice: Option<&'static str>,
}

#[derive(Template)]
#[template(path = "admin/forgot_password.html")]
struct ForgotPasswordTemplate {
    parish_name: String,
    message: Option<&'static str>,
}

#[derive(Template)]
#[template(path = "admin/reset_password.html")]
struct ResetPasswordTemplate {
    parish_name: String,
    token: String,
    error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
    pub reset: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotForm {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetQuery {
    pub token: Option<String>,
}

#[derive(Deserialize)]
pub struct ResetForm {
    pub token: String,
    pub password: String,
}

/// Sign-in page. A live access cookie goes straight to the dashboard; an expired one is
/// renewed from the refresh cookie when possible.
pub async fn login_page(
    State(state): State<SharedState>,
    jar: CookieJar,
    Query(q): Query<LoginQuery>,
) -> Result<Response, AppError> {
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        if jwt::decode_token(cookie.value(), &state.config.jwt_secret).is_ok() {
            return Ok(Redirect::to(HOME).into_response());
        }
    }

    if let Some(cookie) = jar.get(REFRESH_COOKIE) {
        match session::rotate_refresh(&state, cookie.value()).await {
            Ok((fresh, _)) => return Ok((fresh, Redirect::to(HOME)).into_response()),
            Err(e) => tracing::debug!("Session renewal failed: {e}"),
        }
    }

    let page = LoginTemplate {
        parish_name: state.config.parish_name.clone(),
        // Only a missing token is not worth a message
        error: q
            .error
            .as_deref()
            .filter(|code| *code != "auth/missing-token")
            .map(message_for),
        notice: q
            .reset
            .is_some()
            .then_some("Your password has been reset. Please sign in."),
    };
    Ok(render(&page)?.into_response())
}

pub async fn login(
    State(state): State<SharedState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match session::authenticate(&state, &form.email, &form.password).await {
        Ok(user) => {
            audit::log_event(&state.pool, Some(user.id), "user.login", "user", Some(user.id), None)
                .await;
            let (jar, _) = session::issue_session(&state, user).await?;
            Ok((jar, Redirect::to(HOME)).into_response())
        }
        Err(AppError::Auth(code)) => {
            Ok(Redirect::to(&format!("/admin/login?error={}", code.code())).into_response())
        }
        Err(other) => Err(other),
    }
}

pub async fn logout(State(state): State<SharedState>, jar: CookieJar) -> Result<Response, AppError> {
    let cleared = session::end_session(&state, &jar).await?;
    Ok((cleared, Redirect::to("/admin/login")).into_response())
}

pub async fn forgot_password_page(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    render(&ForgotPasswordTemplate {
        parish_name: state.config.parish_name.clone(),
        message: None,
    })
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    Form(form): Form<ForgotForm>,
) -> Result<impl IntoResponse, AppError> {
    session::start_password_reset(&state, &form.email);
    render(&ForgotPasswordTemplate {
        parish_name: state.config.parish_name.clone(),
        message: Some(session::RESET_REQUESTED),
    })
}

pub async fn reset_password_page(
    State(state): State<SharedState>,
    Query(q): Query<ResetQuery>,
) -> Result<impl IntoResponse, AppError> {
    render(&ResetPasswordTemplate {
        parish_name: state.config.parish_name.clone(),
        token: q.token.unwrap_or_default(),
        error: None,
    })
}

pub async fn reset_password(
    State(state): State<SharedState>,
    Form(form): Form<ResetForm>,
) -> Result<Response, AppError> {
    let error = match session::complete_password_reset(&state, &form.token, &form.password).await {
        Ok(()) => return Ok(Redirect::to("/admin/login?reset=1").into_response()),
        Err(AppError::Auth(code)) => code.message().to_string(),
        Err(AppError::BadRequest(msg)) => msg,
        Err(other) => return Err(other),
    };

    Ok(render(&ResetPasswordTemplate {
        parish_name: state.config.parish_name.clone(),
        token: form.token,
        error: Some(error),
    })?
    .into_response())
}
