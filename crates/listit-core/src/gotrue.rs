//! Wire contracts of the hosted auth service (GoTrue).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum::{AsRefStr, Display, EnumString};

use crate::session::{AuthSession, AuthUser};

#[derive(Clone, Copy, Debug, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Apple,
}

/// `type` accepted by `/verify`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, AsRefStr, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OtpType {
    Signup,
    Email,
    Recovery,
    Invite,
    #[strum(serialize = "email_change")]
    #[serde(rename = "email_change")]
    EmailChange,
}

pub fn normalize_auth_url(project_url: &str) -> String {
    let trimmed = project_url.trim().trim_end_matches('/');
    if trimmed.ends_with("/auth/v1") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/auth/v1")
    }
}

#[derive(Debug, Deserialize)]
pub struct GoTrueUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Option<serde_json::Value>,
}

impl From<GoTrueUser> for AuthUser {
    fn from(value: GoTrueUser) -> Self {
        let meta = value.user_metadata.unwrap_or(serde_json::Value::Null);
        let get_s = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| meta.get(*k).and_then(|v| v.as_str()))
                .map(str::to_string)
        };
        Self {
            id: value.id,
            email: value.email,
            display_name: get_s(&["display_name", "full_name", "name"]),
            avatar_url: get_s(&["avatar_url", "picture"]),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthResponseSession {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<GoTrueUser>,
}

/// Body of `/token`, `/signup` and `/verify`; session fields appear either at
/// the top level or nested under `session`.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<GoTrueUser>,
    session: Option<AuthResponseSession>,
    /// `/signup` without autoconfirm returns the bare user object.
    id: Option<String>,
    email: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthOutcome {
    Session(AuthSession),
    /// The account exists but must confirm its email before signing in.
    ConfirmationRequired,
}

impl AuthResponse {
    pub fn into_outcome(self, now_secs: i64) -> Result<AuthOutcome, String> {
        let nested = self.session;
        let access_token = self
            .access_token
            .or_else(|| nested.as_ref().and_then(|s| s.access_token.clone()));
        let refresh_token = self
            .refresh_token
            .or_else(|| nested.as_ref().and_then(|s| s.refresh_token.clone()));
        let expires_at = self
            .expires_at
            .or_else(|| nested.as_ref().and_then(|s| s.expires_at))
            .or_else(|| {
                self.expires_in
                    .or_else(|| nested.as_ref().and_then(|s| s.expires_in))
                    .map(|secs| now_secs.saturating_add(secs))
            });
        let user = self
            .user
            .or_else(|| nested.and_then(|s| s.user))
            .or_else(|| {
                self.id.map(|id| GoTrueUser {
                    id,
                    email: self.email,
                    user_metadata: None,
                })
            })
            .map(AuthUser::from);

        match (access_token, refresh_token, expires_at, user) {
            (Some(access_token), Some(refresh_token), Some(expires_at), Some(user)) => {
                Ok(AuthOutcome::Session(AuthSession {
                    access_token,
                    refresh_token,
                    expires_at,
                    user,
                }))
            }
            (None, None, None, Some(_)) => Ok(AuthOutcome::ConfirmationRequired),
            _ => Err("Auth response did not include enough session fields".to_string()),
        }
    }

    pub fn into_session(self, now_secs: i64) -> Result<AuthSession, String> {
        match self.into_outcome(now_secs)? {
            AuthOutcome::Session(s) => Ok(s),
            AuthOutcome::ConfirmationRequired => {
                Err("Auth response did not include an active session".to_string())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    msg: Option<String>,
}

/// Human-readable message from an error body of the auth or REST API.
pub fn parse_api_error(status: u16, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = payload
            .message
            .or(payload.msg)
            .or(payload.error_description)
            .or(payload.error)
        {
            return message.trim().to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("{trimmed} ({status})")
    }
}

/// RFC 7636 S256 challenge for a verifier.
pub fn pkce_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Verifier from 32 random bytes.
pub fn pkce_verifier(random: &[u8; 32]) -> String {
    URL_SAFE_NO_PAD.encode(random)
}

pub fn authorize_url(
    auth_url: &str,
    provider: OAuthProvider,
    redirect_to: &str,
    code_challenge: &str,
) -> String {
    format!(
        "{auth_url}/authorize?provider={}&redirect_to={}&code_challenge={}&code_challenge_method=s256",
        provider.as_ref(),
        urlencoding::encode(redirect_to),
        urlencoding::encode(code_challenge),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_auth_url_appends_auth_path() {
        assert_eq!(
            normalize_auth_url("https://demo.supabase.co/"),
            "https://demo.supabase.co/auth/v1"
        );
        assert_eq!(
            normalize_auth_url("https://demo.supabase.co/auth/v1"),
            "https://demo.supabase.co/auth/v1"
        );
    }

    #[test]
    fn password_grant_response_becomes_session() {
        let json = r#"{
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "user": {"id": "u1", "email": "u@example.com", "user_metadata": {"full_name": "U Ser"}}
        }"#;
        let parsed: AuthResponse = serde_json::from_str(json).unwrap();
        let session = parsed.into_session(1_000).unwrap();
        assert_eq!(session.expires_at, 4_600);
        assert_eq!(session.user.display_name.as_deref(), Some("U Ser"));
    }

    #[test]
    fn signup_without_autoconfirm_requires_confirmation() {
        let json = r#"{"id": "u1", "email": "u@example.com", "confirmation_sent_at": "2024-01-01"}"#;
        let parsed: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.into_outcome(0), Ok(AuthOutcome::ConfirmationRequired));
    }

    #[test]
    fn partial_session_is_an_error() {
        let json = r#"{"access_token": "a", "user": {"id": "u1"}}"#;
        let parsed: AuthResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.into_outcome(0).is_err());
    }

    #[test]
    fn api_error_prefers_message_fields() {
        assert_eq!(
            parse_api_error(400, r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(parse_api_error(502, ""), "HTTP 502");
        assert_eq!(parse_api_error(500, "boom"), "boom (500)");
    }

    #[test]
    fn pkce_challenge_matches_rfc_example() {
        // RFC 7636 appendix B.
        assert_eq!(
            pkce_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn authorize_url_encodes_redirect() {
        let url = authorize_url(
            "https://p.supabase.co/auth/v1",
            OAuthProvider::Google,
            "https://listit.app/auth/callback?next=/dashboard",
            "abc",
        );
        assert!(url.starts_with("https://p.supabase.co/auth/v1/authorize?provider=google&"));
        assert!(url.contains("redirect_to=https%3A%2F%2Flistit.app%2Fauth%2Fcallback%3Fnext%3D%2Fdashboard"));
        assert!(url.ends_with("code_challenge=abc&code_challenge_method=s256"));
    }

    #[test]
    fn otp_type_wire_names() {
        assert_eq!(OtpType::EmailChange.as_ref(), "email_change");
        assert_eq!("recovery".parse::<OtpType>(), Ok(OtpType::Recovery));
    }
}
