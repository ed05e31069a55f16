use axum::extract::{Query, State};
use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use listit_core::routes::{DASHBOARD, LOGIN};
use listit_core::session::{
    cookie_value, expire_cookie, session_cookies, CookieTokens, CODE_VERIFIER_COOKIE,
};
use serde::Deserialize;

use crate::middleware::{header_string, with_cookies};
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    next: Option<String>,
    error_description: Option<String>,
}

/// Finish an OAuth sign-in: trade the code for a session and set the cookies.
pub async fn auth_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    if let Some(description) = params.error_description {
        return login_error(&description);
    }
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return login_error("Missing authorization code");
    };
    let verifier = header_string(&headers, COOKIE)
        .and_then(|cookies| cookie_value(&cookies, CODE_VERIFIER_COOKIE))
        .filter(|v| !v.is_empty());
    let Some(verifier) = verifier else {
        return login_error("Sign-in expired, please try again");
    };

    match state.auth.exchange_code(&code, &verifier).await {
        Ok(session) => {
            tracing::info!(user_id = %session.user.id, "OAuth sign-in completed");
            let tokens = CookieTokens {
                access_token: session.access_token,
                refresh_token: Some(session.refresh_token),
            };
            let mut cookies = session_cookies(&tokens, state.config.secure_cookies());
            cookies.push(expire_cookie(CODE_VERIFIER_COOKIE));
            let target = safe_next(params.next.as_deref());
            with_cookies(Redirect::temporary(target).into_response(), cookies)
        }
        Err(err) => {
            tracing::warn!(error = %err, "OAuth code exchange failed");
            with_cookies(
                login_error(&err.to_string()),
                vec![expire_cookie(CODE_VERIFIER_COOKIE)],
            )
        }
    }
}

/// Only same-site absolute paths are followed.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => DASHBOARD,
    }
}

fn login_error(message: &str) -> Response {
    let location = format!("{LOGIN}?error={}", urlencoding::encode(message));
    Redirect::temporary(&location).into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use listit_core::{AuthSession, AuthUser};
    use tower::ServiceExt;

    use super::*;
    use crate::backend::AuthBackend;
    use crate::config::ServerConfig;
    use crate::error::AppError;

    struct FakeAuth;

    #[async_trait]
    impl AuthBackend for FakeAuth {
        async fn user_for_token(&self, _access_token: &str) -> Result<AuthUser, AppError> {
            Err(AppError::unauthorized("unused"))
        }

        async fn refresh(&self, _refresh_token: &str) -> Result<AuthSession, AppError> {
            Err(AppError::unauthorized("unused"))
        }

        async fn exchange_code(&self, code: &str, verifier: &str) -> Result<AuthSession, AppError> {
            if code != "good" || verifier != "v1" {
                return Err(AppError::unauthorized("invalid grant"));
            }
            Ok(AuthSession {
                access_token: "a1".into(),
                refresh_token: "r1".into(),
                expires_at: 4_000_000_000,
                user: AuthUser {
                    id: "u1".into(),
                    email: None,
                    display_name: None,
                    avatar_url: None,
                },
            })
        }
    }

    fn app() -> Router {
        let config = ServerConfig::from_lookup(|key| match key {
            "SUPABASE_URL" => Some("http://localhost:54321".into()),
            "SUPABASE_ANON_KEY" => Some("anon".into()),
            _ => None,
        })
        .unwrap();
        let state = AppState {
            config: Arc::new(config),
            auth: Arc::new(FakeAuth),
            admin: None,
        };
        Router::new()
            .route("/auth/callback", get(auth_callback))
            .with_state(state)
    }

    async fn call(uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        app().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers().get("location").unwrap().to_str().unwrap()
    }

    #[tokio::test]
    async fn successful_exchange_sets_cookies_and_follows_next() {
        let response = call("/auth/callback?code=good&next=/today", Some("listit-code-verifier=v1")).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/today");
        let cookies: Vec<_> = response
            .headers()
            .get_all("set-cookie")
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert!(cookies.iter().any(|c| c.starts_with("listit-access-token=a1")));
        assert!(cookies.iter().any(|c| c.starts_with("listit-code-verifier=;")));
    }

    #[tokio::test]
    async fn missing_verifier_returns_to_login() {
        let response = call("/auth/callback?code=good", None).await;
        assert!(location(&response).starts_with("/login?error="));
    }

    #[tokio::test]
    async fn rejected_code_returns_to_login() {
        let response = call("/auth/callback?code=bad", Some("listit-code-verifier=v1")).await;
        assert!(location(&response).starts_with("/login?error="));
    }

    #[test]
    fn next_must_be_same_site() {
        assert_eq!(safe_next(Some("//evil.example")), DASHBOARD);
        assert_eq!(safe_next(Some("https://evil.example")), DASHBOARD);
        assert_eq!(safe_next(None), DASHBOARD);
        assert_eq!(safe_next(Some("/List/abc")), "/List/abc");
    }
}
