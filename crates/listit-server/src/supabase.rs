use async_trait::async_trait;
use listit_core::cascade::DeleteStep;
use listit_core::gotrue::{normalize_auth_url, parse_api_error, AuthResponse, GoTrueUser};
use listit_core::postgrest::Query;
use listit_core::{AuthSession, AuthUser};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;

use crate::backend::{AdminBackend, AuthBackend};
use crate::config::ServerConfig;
use crate::error::AppError;

/// Auth API client keyed with the public anon key.
#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    auth_url: String,
    anon_key: String,
}

impl SupabaseAuth {
    pub fn new(client: Client, config: &ServerConfig) -> Self {
        Self {
            client,
            auth_url: normalize_auth_url(&config.supabase_url),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<AuthSession, AppError> {
        let response = self
            .client
            .post(format!("{}/token?grant_type={grant_type}", self.auth_url))
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response, |message| AppError::unauthorized(message)).await?;
        let payload: AuthResponse = response.json().await?;
        payload
            .into_session(chrono::Utc::now().timestamp())
            .map_err(AppError::external)
    }
}

#[async_trait]
impl AuthBackend for SupabaseAuth {
    async fn user_for_token(&self, access_token: &str) -> Result<AuthUser, AppError> {
        let response = self
            .client
            .get(format!("{}/user", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        let response = ensure_success(response, |message| AppError::unauthorized(message)).await?;
        let user: GoTrueUser = response.json().await?;
        Ok(user.into())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AppError> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn exchange_code(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<AuthSession, AppError> {
        self.token_grant(
            "pkce",
            json!({ "auth_code": auth_code, "code_verifier": code_verifier }),
        )
        .await
    }
}

/// REST and auth-admin client keyed with the service role.
#[derive(Clone)]
pub struct SupabaseAdmin {
    client: Client,
    project_url: String,
    auth_url: String,
    service_key: String,
}

#[derive(Deserialize)]
struct IdRow {
    id: String,
}

impl SupabaseAdmin {
    /// `None` when no service role key is configured.
    pub fn from_config(client: Client, config: &ServerConfig) -> Option<Self> {
        let service_key = config.service_role_key.clone()?;
        Some(Self {
            client,
            project_url: config.supabase_url.clone(),
            auth_url: normalize_auth_url(&config.supabase_url),
            service_key,
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

#[async_trait]
impl AdminBackend for SupabaseAdmin {
    async fn select_ids(&self, query: &Query) -> Result<Vec<String>, AppError> {
        if query.matches_nothing() {
            return Ok(Vec::new());
        }
        let url = format!("{}{}", self.project_url, query.path());
        let response = self.authorized(self.client.get(url)).send().await?;
        let response = ensure_success(response, AppError::external).await?;
        let rows: Vec<IdRow> = response.json().await?;
        Ok(rows.into_iter().map(|row| row.id).collect())
    }

    async fn delete_rows(&self, step: &DeleteStep) -> Result<(), AppError> {
        let url = format!("{}{}", self.project_url, step.path());
        let response = self.authorized(self.client.delete(url)).send().await?;
        ensure_success(response, AppError::external).await?;
        Ok(())
    }

    async fn delete_auth_user(&self, user_id: &str) -> Result<(), AppError> {
        let url = format!(
            "{}/admin/users/{}",
            self.auth_url,
            urlencoding::encode(user_id)
        );
        let response = self.authorized(self.client.delete(url)).send().await?;
        ensure_success(response, AppError::external).await?;
        Ok(())
    }
}

async fn ensure_success(
    response: Response,
    to_error: impl FnOnce(String) -> AppError,
) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(to_error(parse_api_error(status.as_u16(), &body)))
}
