use axum::extract::{Request, State};
use axum::http::header::{COOKIE, REFERER, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use listit_core::routes::{classify, decide, RouteClass, RouteDecision, SessionState};
use listit_core::session::{
    cleared_auth_cookies, decode_claims, session_cookies, set_cookie, tokens_from_cookie_header,
    CookieTokens, EXPIRY_SKEW_SECONDS, LOGGED_IN_COOKIE, SESSION_COOKIE_MAX_AGE_SECS,
};

use crate::backend::AuthBackend;
use crate::error::AppError;
use crate::routes::AppState;

/// Session carried by the request cookies, refreshed when close to expiry.
#[derive(Debug)]
pub(crate) struct ResolvedSession {
    pub tokens: CookieTokens,
    pub refreshed: bool,
}

pub(crate) async fn resolve_session(
    auth: &dyn AuthBackend,
    cookie_header: Option<&str>,
    now_secs: i64,
) -> Result<Option<ResolvedSession>, AppError> {
    let Some(header) = cookie_header else {
        return Ok(None);
    };
    let tokens = tokens_from_cookie_header(header)
        .map_err(|err| AppError::unauthorized(err.to_string()))?;
    let Some(tokens) = tokens else {
        return Ok(None);
    };

    let claims =
        decode_claims(&tokens.access_token).map_err(|err| AppError::unauthorized(err.to_string()))?;
    if claims.exp > now_secs + EXPIRY_SKEW_SECONDS {
        return Ok(Some(ResolvedSession {
            tokens,
            refreshed: false,
        }));
    }

    let refresh_token = tokens
        .refresh_token
        .as_deref()
        .ok_or_else(|| AppError::unauthorized("Access token expired"))?;
    let session = auth.refresh(refresh_token).await?;
    Ok(Some(ResolvedSession {
        tokens: CookieTokens {
            access_token: session.access_token,
            refresh_token: Some(session.refresh_token),
        },
        refreshed: true,
    }))
}

pub async fn route_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let class = classify(&path, request.uri().query());
    let secure = state.config.secure_cookies();

    match class {
        RouteClass::Skipped => return next.run(request).await,
        RouteClass::Logout => {
            tracing::info!(path = %path, "Clearing auth cookies for logout");
            let response = next.run(request).await;
            return with_cookies(response, cleared_auth_cookies());
        }
        _ => {}
    }

    let cookie_header = header_string(request.headers(), COOKIE);
    let referer = header_string(request.headers(), REFERER);
    let now = chrono::Utc::now().timestamp();

    let (session_state, resolved) =
        match resolve_session(state.auth.as_ref(), cookie_header.as_deref(), now).await {
            Ok(Some(resolved)) => (SessionState::Active, Some(resolved)),
            Ok(None) => (SessionState::Missing, None),
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "Session lookup failed");
                (SessionState::Failed, None)
            }
        };

    match decide(class, &path, session_state, referer.as_deref()) {
        RouteDecision::PassThrough => next.run(request).await,
        RouteDecision::ClearCookies => with_cookies(next.run(request).await, cleared_auth_cookies()),
        RouteDecision::Redirect {
            location,
            clear_cookies,
        } => {
            tracing::info!(from = %path, to = location, "Redirecting navigation");
            let response = Redirect::temporary(location).into_response();
            if clear_cookies {
                with_cookies(response, cleared_auth_cookies())
            } else {
                response
            }
        }
        RouteDecision::Continue { logged_in } => {
            let response = next.run(request).await;
            match resolved {
                Some(resolved) if logged_in => {
                    if resolved.refreshed {
                        tracing::debug!(path = %path, "Refreshed session cookies");
                    }
                    with_cookies(response, session_cookies(&resolved.tokens, secure))
                }
                _ => with_cookies(
                    response,
                    vec![set_cookie(
                        LOGGED_IN_COOKIE,
                        "false",
                        SESSION_COOKIE_MAX_AGE_SECS,
                        secure,
                    )],
                ),
            }
        }
    }
}

pub(crate) fn header_string(headers: &HeaderMap, name: axum::http::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

pub(crate) fn with_cookies(mut response: Response, cookies: Vec<String>) -> Response {
    for cookie in cookies {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(err) => tracing::warn!(error = %err, "Skipping invalid Set-Cookie value"),
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use listit_core::{AuthSession, AuthUser};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::config::ServerConfig;

    fn token(exp: i64) -> String {
        let payload = URL_SAFE_NO_PAD.encode(json!({ "sub": "u1", "exp": exp }).to_string());
        format!("e30.{payload}.sig")
    }

    struct FakeAuth {
        refreshes: AtomicUsize,
        fail_refresh: bool,
    }

    impl FakeAuth {
        fn new(fail_refresh: bool) -> Self {
            Self {
                refreshes: AtomicUsize::new(0),
                fail_refresh,
            }
        }
    }

    #[async_trait]
    impl AuthBackend for FakeAuth {
        async fn user_for_token(&self, _access_token: &str) -> Result<AuthUser, AppError> {
            Ok(AuthUser {
                id: "u1".into(),
                email: None,
                display_name: None,
                avatar_url: None,
            })
        }

        async fn refresh(&self, _refresh_token: &str) -> Result<AuthSession, AppError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            if self.fail_refresh {
                return Err(AppError::unauthorized("refresh token revoked"));
            }
            Ok(AuthSession {
                access_token: "fresh-access".into(),
                refresh_token: "fresh-refresh".into(),
                expires_at: i64::MAX,
                user: self.user_for_token("").await?,
            })
        }

        async fn exchange_code(&self, _code: &str, _verifier: &str) -> Result<AuthSession, AppError> {
            Err(AppError::unauthorized("unused"))
        }
    }

    fn test_config() -> Arc<ServerConfig> {
        Arc::new(
            ServerConfig::from_lookup(|key| match key {
                "SUPABASE_URL" => Some("http://localhost:54321".into()),
                "SUPABASE_ANON_KEY" => Some("anon".into()),
                _ => None,
            })
            .unwrap(),
        )
    }

    fn guarded_app(auth: Arc<FakeAuth>) -> Router {
        let state = AppState {
            config: test_config(),
            auth,
            admin: None,
        };
        Router::new()
            .route("/dashboard", get(|| async { "dashboard" }))
            .route("/login", get(|| async { "login" }))
            .route("/landingpage", get(|| async { "landing" }))
            .route("/pkg/app.js", get(|| async { "js" }))
            .layer(axum::middleware::from_fn_with_state(state.clone(), route_guard))
            .with_state(state)
    }

    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect()
    }

    async fn send(app: Router, uri: &str, cookie: Option<&str>, referer: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        if let Some(referer) = referer {
            builder = builder.header(REFERER, referer);
        }
        app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn protected_route_without_session_redirects_to_login() {
        let response = send(guarded_app(Arc::new(FakeAuth::new(false))), "/dashboard", None, None).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers().get("location").unwrap(), "/login");
    }

    #[tokio::test]
    async fn protected_route_with_live_session_passes_and_mirrors_cookies() {
        let cookie = format!("listit-access-token={}; listit-refresh-token=r1", token(i64::MAX / 2));
        let response = send(
            guarded_app(Arc::new(FakeAuth::new(false))),
            "/dashboard",
            Some(&cookie),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|c| c.starts_with("isLoggedIn=true")));
    }

    #[tokio::test]
    async fn expired_access_token_is_refreshed() {
        let auth = Arc::new(FakeAuth::new(false));
        let cookie = format!("listit-access-token={}; listit-refresh-token=r1", token(10));
        let response = send(guarded_app(auth.clone()), "/dashboard", Some(&cookie), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(auth.refreshes.load(Ordering::SeqCst), 1);
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|c| c.starts_with("listit-access-token=fresh-access")));
    }

    #[tokio::test]
    async fn failed_refresh_on_protected_route_clears_cookies() {
        let cookie = format!("listit-access-token={}; listit-refresh-token=r1", token(10));
        let response = send(
            guarded_app(Arc::new(FakeAuth::new(true))),
            "/dashboard",
            Some(&cookie),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|c| c.starts_with("listit-access-token=;")));
    }

    #[tokio::test]
    async fn signed_in_visit_to_login_goes_to_dashboard() {
        let cookie = format!("listit-access-token={}", token(i64::MAX / 2));
        let response = send(
            guarded_app(Arc::new(FakeAuth::new(false))),
            "/login",
            Some(&cookie),
            Some("http://localhost:3000/landingpage"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers().get("location").unwrap(), "/dashboard");
    }

    #[tokio::test]
    async fn logout_query_clears_cookies_without_redirect() {
        let cookie = format!("listit-access-token={}", token(i64::MAX / 2));
        let response = send(
            guarded_app(Arc::new(FakeAuth::new(false))),
            "/login?logout=true",
            Some(&cookie),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookies(&response)
            .iter()
            .any(|c| c.starts_with("isLoggedIn=;")));
    }

    #[tokio::test]
    async fn static_assets_skip_session_checks() {
        let auth = Arc::new(FakeAuth::new(false));
        let response = send(guarded_app(auth.clone()), "/pkg/app.js", Some("listit-refresh-token=r1"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookies(&response).is_empty());
    }

    #[tokio::test]
    async fn public_page_without_session_marks_logged_out() {
        let response = send(guarded_app(Arc::new(FakeAuth::new(false))), "/landingpage", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookies(&response)
            .iter()
            .any(|c| c.starts_with("isLoggedIn=false")));
    }
}
