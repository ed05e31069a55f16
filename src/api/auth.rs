use listit_core::gotrue::{
    authorize_url, AuthOutcome, AuthResponse, GoTrueUser, OAuthProvider, OtpType,
};
use listit_core::routes::{AUTH_CALLBACK, RESET_PASSWORD, VERIFICATION};
use listit_core::{AuthSession, AuthUser};
use serde_json::json;

use super::{ApiClient, ApiError, ApiResult};
use crate::util::now_secs;

impl ApiClient {
    fn redirect_to(&self, path: &str) -> String {
        format!("{}{}", self.site_url(), path)
    }

    async fn auth_outcome(&self, req: reqwest::RequestBuilder) -> ApiResult<AuthOutcome> {
        let body: AuthResponse = self.send_json(req).await?;
        body.into_outcome(now_secs()).map_err(ApiError::parse)
    }

    async fn auth_session(&self, req: reqwest::RequestBuilder) -> ApiResult<AuthSession> {
        let body: AuthResponse = self.send_json(req).await?;
        body.into_session(now_secs()).map_err(ApiError::parse)
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> ApiResult<AuthSession> {
        let req = reqwest::Client::new()
            .post(format!("{}/token?grant_type=password", self.auth_url()))
            .json(&json!({ "email": email, "password": password }));
        self.auth_session(req).await
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> ApiResult<AuthSession> {
        let req = reqwest::Client::new()
            .post(format!("{}/token?grant_type=refresh_token", self.auth_url()))
            .json(&json!({ "refresh_token": refresh_token }));
        self.auth_session(req).await
    }

    /// New accounts confirm their email through the verification page.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> ApiResult<AuthOutcome> {
        let url = format!(
            "{}/signup?redirect_to={}",
            self.auth_url(),
            urlencoding::encode(&self.redirect_to(VERIFICATION))
        );
        let req = reqwest::Client::new().post(url).json(&json!({
            "email": email,
            "password": password,
            "data": { "display_name": display_name },
        }));
        self.auth_outcome(req).await
    }

    pub async fn sign_out(&self) -> ApiResult<()> {
        if !self.is_authenticated() {
            return Ok(());
        }
        let req = reqwest::Client::new().post(format!("{}/logout", self.auth_url()));
        self.send(req).await.map(|_| ())
    }

    pub async fn recover_password(&self, email: &str) -> ApiResult<()> {
        let url = format!(
            "{}/recover?redirect_to={}",
            self.auth_url(),
            urlencoding::encode(&self.redirect_to(RESET_PASSWORD))
        );
        let req = reqwest::Client::new()
            .post(url)
            .json(&json!({ "email": email }));
        self.send(req).await.map(|_| ())
    }

    pub async fn get_user(&self) -> ApiResult<AuthUser> {
        if !self.is_authenticated() {
            return Err(ApiError::unauthorized("Not signed in"));
        }
        let req = reqwest::Client::new().get(format!("{}/user", self.auth_url()));
        let user: GoTrueUser = self.send_json(req).await?;
        Ok(user.into())
    }

    pub async fn update_password(&self, password: &str) -> ApiResult<AuthUser> {
        if !self.is_authenticated() {
            return Err(ApiError::unauthorized(
                "Your reset link has expired, request a new one",
            ));
        }
        let req = reqwest::Client::new()
            .put(format!("{}/user", self.auth_url()))
            .json(&json!({ "password": password }));
        let user: GoTrueUser = self.send_json(req).await?;
        Ok(user.into())
    }

    pub async fn verify_otp(&self, token_hash: &str, kind: OtpType) -> ApiResult<AuthOutcome> {
        let req = reqwest::Client::new()
            .post(format!("{}/verify", self.auth_url()))
            .json(&json!({ "type": kind, "token_hash": token_hash }));
        self.auth_outcome(req).await
    }

    /// Provider sign-in page; the backend sends the browser back to the
    /// server's callback route with a PKCE code.
    pub fn oauth_url(&self, provider: OAuthProvider, code_challenge: &str) -> String {
        authorize_url(
            &self.auth_url(),
            provider,
            &self.redirect_to(AUTH_CALLBACK),
            code_challenge,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::EnvConfig;
    use super::*;

    #[test]
    fn oauth_url_targets_callback_route() {
        let client = ApiClient::new(EnvConfig::with_values(
            "https://demo.supabase.co".into(),
            "anon".into(),
            "https://listit.app".into(),
        ));
        let url = client.oauth_url(OAuthProvider::Google, "challenge");
        assert!(url.starts_with("https://demo.supabase.co/auth/v1/authorize?provider=google"));
        assert!(url.contains("redirect_to=https%3A%2F%2Flistit.app%2Fauth%2Fcallback"));
        assert!(url.contains("code_challenge_method=s256"));
    }
}
