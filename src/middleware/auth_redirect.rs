use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

pub const LOGIN_PATH: &str = "/admin/login";

/// Dashboard pages answer a missing or stale session with a trip to the sign-in page,
/// carrying the auth code so the page can say why.
pub async fn redirect_unauthorized(req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    if response.status() != StatusCode::UNAUTHORIZED {
        return response;
    }
    match response
        .headers()
        .get(AUTH_CODE_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(code) => Redirect::to(&format!("{LOGIN_PATH}?error={code}")).into_response(),
        None => Redirect::to(LOGIN_PATH).into_response(),
    }
}

/// Set by [`crate::error::AppError`] on auth failures.
pub const AUTH_CODE_HEADER: &str = "x-auth-code";

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::AuthErrorCode;
    use crate::error::AppError;

    fn app() -> Router {
        Router::new()
            .route("/expired", get(|| async { AppError::Auth(AuthErrorCode::TokenExpired) }))
            .route(
                "/plain",
                get(|| async { (StatusCode::UNAUTHORIZED, "no code").into_response() }),
            )
            .route(
                "/forbidden",
                get(|| async { AppError::Forbidden("staff".to_string()) }),
            )
            .layer(axum::middleware::from_fn(redirect_unauthorized))
    }

    async fn call(path: &str) -> Response {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        app().oneshot(req).await.unwrap()
    }

    #[tokio::test]
    async fn auth_failures_redirect_with_code() {
        let resp = call("/expired").await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()["location"], "/admin/login?error=auth/token-expired");
    }

    #[tokio::test]
    async fn bare_unauthorized_goes_to_login() {
        let resp = call("/plain").await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()["location"], LOGIN_PATH);
    }

    #[tokio::test]
    async fn other_errors_pass_through() {
        let resp = call("/forbidden").await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
