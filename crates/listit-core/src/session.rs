//! Session records and the cookie mirror the middleware reads.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ACCESS_TOKEN_COOKIE: &str = "listit-access-token";
pub const REFRESH_TOKEN_COOKIE: &str = "listit-refresh-token";
pub const LOGGED_IN_COOKIE: &str = "isLoggedIn";
pub const CODE_VERIFIER_COOKIE: &str = "listit-code-verifier";

/// Every cookie logout and the middleware are allowed to expire.
pub const AUTH_COOKIES: &[&str] = &[
    ACCESS_TOKEN_COOKIE,
    REFRESH_TOKEN_COOKIE,
    LOGGED_IN_COOKIE,
    CODE_VERIFIER_COOKIE,
];

/// Storage keys containing any of these are treated as auth state on logout.
pub const AUTH_STORAGE_MARKERS: &[&str] = &["supabase", "sb-", "auth", "session", "token"];

pub const SESSION_COOKIE_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// Access tokens this close to expiry are refreshed eagerly.
pub const EXPIRY_SKEW_SECONDS: i64 = 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Malformed access token: {0}")]
    MalformedToken(&'static str),
    #[error("Session cookie is incomplete")]
    IncompleteCookies,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl AuthUser {
    pub fn label(&self) -> String {
        self.display_name
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| "Account".to_string())
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds.
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        self.expires_at <= now_secs + EXPIRY_SKEW_SECONDS
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Claims read from an access token. The signature is not checked here; the
/// backend verifies tokens on every data call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub email: Option<String>,
}

pub fn decode_claims(token: &str) -> Result<TokenClaims, SessionError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_sig), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(SessionError::MalformedToken("expected three segments"));
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| SessionError::MalformedToken("payload is not base64url"))?;
    serde_json::from_slice(&bytes).map_err(|_| SessionError::MalformedToken("payload is not JSON"))
}

/// Tokens as mirrored into cookies.
#[derive(Clone, PartialEq, Eq)]
pub struct CookieTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl fmt::Debug for CookieTokens {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CookieTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Read the session tokens out of a `Cookie` header.
///
/// `Ok(None)` means there is no session; an error means cookies are present
/// but unusable.
pub fn tokens_from_cookie_header(header: &str) -> Result<Option<CookieTokens>, SessionError> {
    let access = cookie_value(header, ACCESS_TOKEN_COOKIE).filter(|v| !v.is_empty());
    let refresh = cookie_value(header, REFRESH_TOKEN_COOKIE).filter(|v| !v.is_empty());
    match (access, refresh) {
        (None, None) => Ok(None),
        (None, Some(_)) => Err(SessionError::IncompleteCookies),
        (Some(access_token), refresh_token) => Ok(Some(CookieTokens {
            access_token,
            refresh_token,
        })),
    }
}

/// Session rebuilt from the cookies the server callback sets after an OAuth
/// sign-in. The user carries only what the token claims; callers fetch the
/// full profile afterwards.
pub fn session_from_cookies(header: &str) -> Result<Option<AuthSession>, SessionError> {
    let Some(tokens) = tokens_from_cookie_header(header)? else {
        return Ok(None);
    };
    let refresh_token = tokens.refresh_token.ok_or(SessionError::IncompleteCookies)?;
    let claims = decode_claims(&tokens.access_token)?;
    Ok(Some(AuthSession {
        access_token: tokens.access_token,
        refresh_token,
        expires_at: claims.exp,
        user: AuthUser {
            id: claims.sub,
            email: claims.email,
            display_name: None,
            avatar_url: None,
        },
    }))
}

/// Seconds to wait before refreshing a session expiring at `expires_at`.
pub fn refresh_delay_secs(expires_at: i64, now_secs: i64) -> i64 {
    (expires_at - now_secs - EXPIRY_SKEW_SECONDS).max(0)
}

pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        if k.trim() == name {
            Some(
                urlencoding::decode(v.trim())
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| v.trim().to_string()),
            )
        } else {
            None
        }
    })
}

/// `Set-Cookie` / `document.cookie` value for a readable, site-wide cookie.
pub fn set_cookie(name: &str, value: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{name}={}; Path=/; Max-Age={max_age_secs}; SameSite=Lax",
        urlencoding::encode(value)
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn expire_cookie(name: &str) -> String {
    format!("{name}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; SameSite=Lax")
}

/// Cookies mirroring a live session: tokens plus the logged-in flag.
pub fn session_cookies(tokens: &CookieTokens, secure: bool) -> Vec<String> {
    let mut out = vec![
        set_cookie(
            ACCESS_TOKEN_COOKIE,
            &tokens.access_token,
            SESSION_COOKIE_MAX_AGE_SECS,
            secure,
        ),
        set_cookie(LOGGED_IN_COOKIE, "true", SESSION_COOKIE_MAX_AGE_SECS, secure),
    ];
    if let Some(refresh) = &tokens.refresh_token {
        out.push(set_cookie(
            REFRESH_TOKEN_COOKIE,
            refresh,
            SESSION_COOKIE_MAX_AGE_SECS,
            secure,
        ));
    }
    out
}

pub fn cleared_auth_cookies() -> Vec<String> {
    AUTH_COOKIES.iter().map(|name| expire_cookie(name)).collect()
}

pub fn is_auth_storage_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    AUTH_STORAGE_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(payload: &serde_json::Value) -> String {
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
        format!("eyJhbGciOiJIUzI1NiJ9.{body}.sig")
    }

    #[test]
    fn decodes_claims_from_access_token() {
        let token = token_with(&serde_json::json!({"sub": "u1", "exp": 1_700_000_000, "email": "a@b.c"}));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.exp, 1_700_000_000);
        assert_eq!(claims.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn rejects_tokens_without_three_segments() {
        assert_eq!(
            decode_claims("abc.def"),
            Err(SessionError::MalformedToken("expected three segments"))
        );
    }

    #[test]
    fn reads_tokens_from_cookie_header() {
        let header = "theme=dark; listit-access-token=abc; listit-refresh-token=r%2B1";
        let tokens = tokens_from_cookie_header(header).unwrap().unwrap();
        assert_eq!(tokens.access_token, "abc");
        assert_eq!(tokens.refresh_token.as_deref(), Some("r+1"));
    }

    #[test]
    fn missing_cookies_mean_no_session() {
        assert_eq!(tokens_from_cookie_header("theme=dark").unwrap(), None);
    }

    #[test]
    fn refresh_without_access_is_an_error() {
        assert_eq!(
            tokens_from_cookie_header("listit-refresh-token=r"),
            Err(SessionError::IncompleteCookies)
        );
    }

    #[test]
    fn session_cookies_last_one_week() {
        let cookies = session_cookies(
            &CookieTokens {
                access_token: "a".into(),
                refresh_token: None,
            },
            true,
        );
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].contains("Max-Age=604800"));
        assert!(cookies[0].ends_with("; Secure"));
        assert!(cookies[1].starts_with("isLoggedIn=true"));
    }

    #[test]
    fn clears_every_named_auth_cookie() {
        let cleared = cleared_auth_cookies();
        for name in AUTH_COOKIES {
            assert!(cleared.iter().any(|c| c.starts_with(&format!("{name}=;"))));
        }
    }

    #[test]
    fn auth_storage_keys_match_by_substring() {
        assert!(is_auth_storage_key("sb-project-auth-token"));
        assert!(is_auth_storage_key("listit_session"));
        assert!(is_auth_storage_key("SUPABASE.cache"));
        assert!(!is_auth_storage_key("listit_theme"));
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let session = AuthSession {
            access_token: "secret-access".into(),
            refresh_token: "secret-refresh".into(),
            expires_at: 10,
            user: AuthUser {
                id: "u".into(),
                email: None,
                display_name: None,
                avatar_url: None,
            },
        };
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-access"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(session.is_expired_at(0));
        assert!(!AuthSession { expires_at: 1_000, ..session }.is_expired_at(0));
    }

    #[test]
    fn rebuilds_session_from_callback_cookies() {
        let token = token_with(&serde_json::json!({"sub": "u9", "exp": 1_900_000_000, "email": "o@auth.io"}));
        let header = format!("isLoggedIn=true; listit-access-token={token}; listit-refresh-token=r9");
        let session = session_from_cookies(&header).unwrap().unwrap();
        assert_eq!(session.access_token, token);
        assert_eq!(session.refresh_token, "r9");
        assert_eq!(session.expires_at, 1_900_000_000);
        assert_eq!(session.user.id, "u9");
        assert_eq!(session.user.email.as_deref(), Some("o@auth.io"));
    }

    #[test]
    fn cookie_session_needs_both_tokens() {
        assert_eq!(session_from_cookies("theme=dark"), Ok(None));
        let token = token_with(&serde_json::json!({"sub": "u9", "exp": 1}));
        assert_eq!(
            session_from_cookies(&format!("listit-access-token={token}")),
            Err(SessionError::IncompleteCookies)
        );
        assert!(matches!(
            session_from_cookies("listit-access-token=junk; listit-refresh-token=r"),
            Err(SessionError::MalformedToken(_))
        ));
    }

    #[test]
    fn refresh_is_scheduled_ahead_of_expiry() {
        assert_eq!(refresh_delay_secs(10_000, 6_400), 3_600 - EXPIRY_SKEW_SECONDS);
        assert_eq!(refresh_delay_secs(10_000, 9_990), 0);
        assert_eq!(refresh_delay_secs(10_000, 20_000), 0);
    }
}
