//! Session lifecycle for the browser.
//!
//! `AuthService` is created once in `App`, bootstrapped with [`AuthService::init`]
//! and shared through context. Every change of session is mirrored into
//! localStorage and cookies so the server guard sees the same state, and is
//! announced on `last_event`. Access tokens are refreshed on a timer shortly
//! before they expire.

use gloo_timers::future::TimeoutFuture;
use leptos::ev;
use leptos::logging::{log, warn};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;
use listit_core::gotrue::{
    pkce_challenge, pkce_verifier, AuthOutcome as SignUpOutcome, OAuthProvider, OtpType,
};
use listit_core::mutation::settle_then;
use listit_core::routes::{DASHBOARD, LOGOUT_REDIRECT};
use listit_core::session::{refresh_delay_secs, set_cookie, CODE_VERIFIER_COOKIE};
use listit_core::validation::{validate_email, validate_new_password, validate_password};
use listit_core::{AuthSession, AuthUser};

use crate::api::{ApiClient, ApiErrorKind};
use crate::storage::{
    clear_auth_storage, is_secure_origin, load_session, save_session, write_cookie, SESSION_KEY,
};
use crate::util::{now_secs, random_bytes};

/// Verifier cookie only needs to outlive the provider round trip.
const CODE_VERIFIER_MAX_AGE_SECS: i64 = 10 * 60;

/// Wait before retrying a token refresh that failed on the network or was
/// rate limited.
const REFRESH_RETRY_SECS: i64 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    PasswordRecovery,
}

/// Result of an auth action as shown by the forms.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct AuthOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl AuthOutcome {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Tokens delivered in a redirect fragment (`#access_token=...&type=recovery`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FragmentTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<i64>,
    pub expires_in: Option<i64>,
    pub kind: Option<String>,
}

pub(crate) fn parse_fragment(fragment: &str) -> Option<FragmentTokens> {
    let fragment = fragment.trim_start_matches('#');
    let get = |name: &str| {
        fragment.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k == name).then(|| {
                urlencoding::decode(v)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| v.to_string())
            })
        })
    };
    Some(FragmentTokens {
        access_token: get("access_token").filter(|s| !s.is_empty())?,
        refresh_token: get("refresh_token").filter(|s| !s.is_empty())?,
        expires_at: get("expires_at").and_then(|v| v.parse().ok()),
        expires_in: get("expires_in").and_then(|v| v.parse().ok()),
        kind: get("type"),
    })
}

#[derive(Clone, Copy)]
pub(crate) struct AuthService {
    api_client: RwSignal<ApiClient>,
    pub is_logged_in: RwSignal<bool>,
    pub user: RwSignal<Option<AuthUser>>,
    /// True until the stored session has been checked.
    pub loading: RwSignal<bool>,
    pub last_event: RwSignal<Option<AuthEvent>>,
    initialized: StoredValue<bool>,
    /// Bumped on every session change; a pending refresh timer with an older
    /// value gives up.
    refresh_generation: StoredValue<u64>,
}

impl AuthService {
    pub fn new(api_client: RwSignal<ApiClient>) -> Self {
        let user = api_client.with_untracked(|c| c.session.as_ref().map(|s| s.user.clone()));
        Self {
            api_client,
            is_logged_in: RwSignal::new(user.is_some()),
            user: RwSignal::new(user),
            loading: RwSignal::new(true),
            last_event: RwSignal::new(None),
            initialized: StoredValue::new(false),
            refresh_generation: StoredValue::new(0),
        }
    }

    fn emit(self, event: AuthEvent) {
        log!("auth event: {event:?}");
        self.last_event.set(Some(event));
    }

    /// Update observers without touching storage.
    fn apply_session(self, session: Option<AuthSession>) {
        let expires_at = session.as_ref().map(|s| s.expires_at);
        self.is_logged_in.set(session.is_some());
        self.user.set(session.as_ref().map(|s| s.user.clone()));
        self.api_client.update(|c| c.set_session(session));
        match expires_at {
            Some(at) => self.schedule_refresh(refresh_delay_secs(at, now_secs())),
            None => {
                self.cancel_refresh();
            }
        }
    }

    fn cancel_refresh(self) -> u64 {
        let generation = self.refresh_generation.get_value() + 1;
        self.refresh_generation.set_value(generation);
        generation
    }

    /// Refresh the access token after `delay_secs` unless the session changes
    /// in the meantime.
    fn schedule_refresh(self, delay_secs: i64) {
        let generation = self.cancel_refresh();
        let delay_ms = u32::try_from(delay_secs.saturating_mul(1000)).unwrap_or(u32::MAX);
        spawn_local(async move {
            TimeoutFuture::new(delay_ms).await;
            if self.refresh_generation.try_get_value() == Some(generation) {
                self.refresh_now().await;
            }
        });
    }

    async fn refresh_now(self) {
        let client = self.api_client.get_untracked();
        let Some(refresh_token) = client.session.as_ref().map(|s| s.refresh_token.clone()) else {
            return;
        };
        match client.refresh_session(&refresh_token).await {
            Ok(fresh) => {
                self.store_session(fresh);
                self.emit(AuthEvent::TokenRefreshed);
            }
            Err(e) if matches!(e.kind, ApiErrorKind::Network | ApiErrorKind::RateLimited) => {
                warn!("Token refresh failed, retrying in {REFRESH_RETRY_SECS}s: {e}");
                self.schedule_refresh(REFRESH_RETRY_SECS);
            }
            Err(e) => {
                warn!("Refresh token was rejected: {e}");
                clear_auth_storage();
                self.apply_session(None);
                self.emit(AuthEvent::SignedOut);
            }
        }
    }

    fn store_session(self, session: AuthSession) {
        save_session(&session);
        self.apply_session(Some(session));
    }

    /// Runs once per page load; later calls are no-ops.
    pub fn init(self) {
        if self.initialized.get_value() {
            return;
        }
        self.initialized.set_value(true);

        // Another tab signed in or out.
        let handle = window_event_listener(ev::storage, move |ev: web_sys::StorageEvent| {
            if ev.key().as_deref() != Some(SESSION_KEY) {
                return;
            }
            match load_session() {
                Some(session) => {
                    self.apply_session(Some(session));
                    self.emit(AuthEvent::SignedIn);
                }
                None => {
                    self.apply_session(None);
                    self.emit(AuthEvent::SignedOut);
                }
            }
        });
        on_cleanup(move || handle.remove());

        let Some(session) = self.api_client.with_untracked(|c| c.session.clone()) else {
            self.loading.set(false);
            return;
        };

        let client = self.api_client.get_untracked();
        if !session.is_expired_at(now_secs()) {
            self.schedule_refresh(refresh_delay_secs(session.expires_at, now_secs()));
            self.loading.set(false);
            self.emit(AuthEvent::SignedIn);
            spawn_local(async move {
                match client.get_user().await {
                    Ok(user) => {
                        let mut refreshed = session;
                        refreshed.user = user;
                        self.store_session(refreshed);
                    }
                    Err(e) if e.kind == ApiErrorKind::Unauthorized => {
                        warn!("Stored session was rejected: {e}");
                        clear_auth_storage();
                        self.apply_session(None);
                        self.emit(AuthEvent::SignedOut);
                    }
                    Err(e) => warn!("Could not refresh profile: {e}"),
                }
            });
            return;
        }

        spawn_local(async move {
            match client.refresh_session(&session.refresh_token).await {
                Ok(fresh) => {
                    self.store_session(fresh);
                    self.emit(AuthEvent::TokenRefreshed);
                }
                Err(e) => {
                    warn!("Session refresh failed: {e}");
                    clear_auth_storage();
                    self.apply_session(None);
                    self.emit(AuthEvent::SignedOut);
                }
            }
            self.loading.set(false);
        });
    }

    pub fn user_id(self) -> Option<String> {
        self.user.with_untracked(|u| u.as_ref().map(|u| u.id.clone()))
    }

    pub async fn login(self, email: String, password: String) -> AuthOutcome {
        let email = match validate_email(&email) {
            Ok(email) => email,
            Err(e) => return AuthOutcome::failed(e.to_string()),
        };
        if password.is_empty() {
            return AuthOutcome::failed("Password is required");
        }

        let client = self.api_client.get_untracked();
        match client.sign_in_with_password(&email, &password).await {
            Ok(session) => {
                self.store_session(session);
                self.emit(AuthEvent::SignedIn);
                let _ = window().location().set_href(DASHBOARD);
                AuthOutcome::ok()
            }
            Err(e) => {
                warn!("Login failed: {e}");
                AuthOutcome::failed(e.message)
            }
        }
    }

    pub fn login_with_google(self) -> Result<(), String> {
        self.login_with_provider(OAuthProvider::Google)
    }

    pub fn login_with_apple(self) -> Result<(), String> {
        self.login_with_provider(OAuthProvider::Apple)
    }

    /// Leaves the page for the provider. The verifier rides along in a cookie
    /// so the server callback can finish the exchange.
    fn login_with_provider(self, provider: OAuthProvider) -> Result<(), String> {
        let random = random_bytes().ok_or("Secure random numbers are unavailable")?;
        let verifier = pkce_verifier(&random);
        write_cookie(&set_cookie(
            CODE_VERIFIER_COOKIE,
            &verifier,
            CODE_VERIFIER_MAX_AGE_SECS,
            is_secure_origin(),
        ));

        let url = self
            .api_client
            .with_untracked(|c| c.oauth_url(provider, &pkce_challenge(&verifier)));
        window()
            .location()
            .set_href(&url)
            .map_err(|_| format!("Could not open {provider} sign-in"))
    }

    /// Local state goes first so the UI never shows a half signed-in state;
    /// storage and cookies are wiped whatever the backend answers.
    pub async fn logout(self) {
        let client = self.api_client.get_untracked();
        self.apply_session(None);

        let (signed_out, removed) = settle_then(client.sign_out(), clear_auth_storage).await;
        if let Err(e) = signed_out {
            warn!("Backend sign-out failed: {e}");
        }
        log!("Cleared {removed} auth storage keys");
        self.emit(AuthEvent::SignedOut);

        let _ = window().location().replace(LOGOUT_REDIRECT);
    }

    pub async fn reset_password(self, email: String) -> AuthOutcome {
        let email = match validate_email(&email) {
            Ok(email) => email,
            Err(e) => return AuthOutcome::failed(e.to_string()),
        };
        let client = self.api_client.get_untracked();
        match client.recover_password(&email).await {
            Ok(()) => AuthOutcome::ok(),
            Err(e) => {
                warn!("Password reset request failed: {e}");
                AuthOutcome::failed(e.message)
            }
        }
    }

    /// `Ok(true)` when the account must confirm its email first.
    pub async fn register(
        self,
        email: String,
        password: String,
        display_name: String,
    ) -> Result<bool, String> {
        let email = validate_email(&email).map_err(|e| e.to_string())?;
        validate_password(&password).map_err(|e| e.to_string())?;

        let client = self.api_client.get_untracked();
        match client.sign_up(&email, &password, display_name.trim()).await {
            Ok(SignUpOutcome::Session(session)) => {
                self.store_session(session);
                self.emit(AuthEvent::SignedIn);
                Ok(false)
            }
            Ok(SignUpOutcome::ConfirmationRequired) => Ok(true),
            Err(e) => {
                warn!("Registration failed: {e}");
                Err(e.message)
            }
        }
    }

    pub async fn update_password(self, password: String, confirm: String) -> AuthOutcome {
        if let Err(e) = validate_new_password(&password, &confirm) {
            return AuthOutcome::failed(e.to_string());
        }
        let client = self.api_client.get_untracked();
        match client.update_password(&password).await {
            Ok(_) => AuthOutcome::ok(),
            Err(e) => {
                warn!("Password update failed: {e}");
                AuthOutcome::failed(e.message)
            }
        }
    }

    pub async fn verify_otp(self, token_hash: String, kind: OtpType) -> AuthOutcome {
        let client = self.api_client.get_untracked();
        match client.verify_otp(&token_hash, kind).await {
            Ok(SignUpOutcome::Session(session)) => {
                self.store_session(session);
                self.emit(if kind == OtpType::Recovery {
                    AuthEvent::PasswordRecovery
                } else {
                    AuthEvent::SignedIn
                });
                AuthOutcome::ok()
            }
            Ok(SignUpOutcome::ConfirmationRequired) => AuthOutcome::ok(),
            Err(e) => {
                warn!("Verification failed: {e}");
                AuthOutcome::failed(e.message)
            }
        }
    }

    /// Adopt a session handed over in the URL fragment by an email link.
    pub async fn adopt_fragment(self, tokens: FragmentTokens) -> AuthOutcome {
        let now = now_secs();
        let mut session = AuthSession {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens
                .expires_at
                .or_else(|| tokens.expires_in.map(|secs| now + secs))
                .unwrap_or(now + 3600),
            user: AuthUser {
                id: String::new(),
                email: None,
                display_name: None,
                avatar_url: None,
            },
        };

        let mut client = self.api_client.get_untracked();
        client.set_session(Some(session.clone()));
        match client.get_user().await {
            Ok(user) => {
                session.user = user;
                self.store_session(session);
                self.emit(if tokens.kind.as_deref() == Some("recovery") {
                    AuthEvent::PasswordRecovery
                } else {
                    AuthEvent::SignedIn
                });
                AuthOutcome::ok()
            }
            Err(e) => {
                warn!("Link session was rejected: {e}");
                AuthOutcome::failed(e.message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recovery_fragment() {
        let tokens = parse_fragment(
            "#access_token=a.b.c&expires_in=3600&refresh_token=r1&token_type=bearer&type=recovery",
        )
        .unwrap();
        assert_eq!(tokens.access_token, "a.b.c");
        assert_eq!(tokens.refresh_token, "r1");
        assert_eq!(tokens.expires_in, Some(3600));
        assert_eq!(tokens.kind.as_deref(), Some("recovery"));
    }

    #[test]
    fn fragment_without_tokens_is_ignored() {
        assert!(parse_fragment("#error=access_denied").is_none());
        assert!(parse_fragment("").is_none());
        assert!(parse_fragment("access_token=&refresh_token=r").is_none());
    }

    #[test]
    fn outcomes_carry_messages() {
        assert!(AuthOutcome::ok().success);
        let failed = AuthOutcome::failed("nope");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("nope"));
    }
}
