mod auth;

use listit_core::cascade::{CascadePlan, DeleteStep};
use listit_core::collections::defaults_to_unset;
use listit_core::gotrue::{normalize_auth_url, parse_api_error};
use listit_core::models::{
    Collection, CollectionPatch, List, ListPatch, NewCollection, NewList, NewNote, NewTask, Note,
    NotePatch, Table, Task, TaskPatch,
};
use listit_core::mutation::with_follow_up;
use listit_core::postgrest::Query;
use listit_core::routes::DELETE_ACCOUNT_API;
use listit_core::validation::parse_wait_seconds;
use listit_core::AuthSession;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::{load_cookie_session, load_session};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
    RateLimited,
    Config,
}

#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn network(e: reqwest::Error) -> Self {
        Self::new(ApiErrorKind::Network, e.to_string())
    }

    pub(crate) fn parse(e: impl std::fmt::Display) -> Self {
        Self::new(ApiErrorKind::Parse, e.to_string())
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Unauthorized, message)
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Config, message)
    }

    /// Map a non-2xx response to an error, keeping the backend's own message.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        let message = parse_api_error(status, body);
        let kind = match status {
            401 | 403 => ApiErrorKind::Unauthorized,
            429 => ApiErrorKind::RateLimited,
            _ if parse_wait_seconds(&message).is_some() => ApiErrorKind::RateLimited,
            _ => ApiErrorKind::Http,
        };
        Self::new(kind, message)
    }

    /// Seconds the backend asked us to wait, if this is a rate-limit error.
    pub(crate) fn wait_seconds(&self) -> Option<u32> {
        if self.kind == ApiErrorKind::RateLimited {
            parse_wait_seconds(&self.message)
        } else {
            None
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct EnvConfig {
    pub supabase_url: String,
    pub anon_key: String,
    pub site_url: String,
}

impl EnvConfig {
    const DEFAULT_SUPABASE_URL: &'static str = "http://localhost:54321";

    /// Reads `window.ENV`; upper-case keys win over their lower-case form.
    pub fn new() -> Self {
        let env = web_sys::window()
            .and_then(|w| w.get("ENV"))
            .filter(|env| !env.is_undefined() && env.is_object());

        let read = |upper: &str, lower: &str| -> Option<String> {
            let env = env.as_ref()?;
            [upper, lower].iter().find_map(|key| {
                js_sys::Reflect::get(env, &(*key).into())
                    .ok()
                    .and_then(|v| v.as_string())
                    .filter(|s| !s.trim().is_empty())
            })
        };

        let origin = web_sys::window()
            .and_then(|w| w.location().origin().ok())
            .unwrap_or_default();

        Self::with_values(
            read("SUPABASE_URL", "supabase_url")
                .unwrap_or_else(|| Self::DEFAULT_SUPABASE_URL.to_string()),
            read("SUPABASE_ANON_KEY", "supabase_anon_key").unwrap_or_default(),
            read("SITE_URL", "site_url").unwrap_or(origin),
        )
    }

    pub fn with_values(supabase_url: String, anon_key: String, site_url: String) -> Self {
        Self {
            supabase_url: supabase_url.trim().trim_end_matches('/').to_string(),
            anon_key: anon_key.trim().to_string(),
            site_url: site_url.trim().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct DeleteAccountReply {
    #[serde(default)]
    success: bool,
}

#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) config: EnvConfig,
    pub(crate) session: Option<AuthSession>,
}

impl ApiClient {
    pub fn new(config: EnvConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn load_from_storage() -> Self {
        Self {
            config: EnvConfig::new(),
            session: load_session().or_else(load_cookie_session),
        }
    }

    pub fn set_session(&mut self, session: Option<AuthSession>) {
        self.session = session;
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn user_id(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.user.id.clone())
    }

    pub(crate) fn auth_url(&self) -> String {
        normalize_auth_url(&self.config.supabase_url)
    }

    pub(crate) fn site_url(&self) -> &str {
        &self.config.site_url
    }

    /// `Authorization` value: the user's token when signed in, else the anon key.
    pub(crate) fn get_auth_header(&self) -> String {
        let token = self
            .session
            .as_ref()
            .map(|s| s.access_token.as_str())
            .unwrap_or(&self.config.anon_key);
        format!("Bearer {token}")
    }

    fn with_auth_headers(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.config.anon_key)
            .header("Authorization", self.get_auth_header())
    }

    fn ensure_configured(&self) -> ApiResult<()> {
        if self.config.anon_key.is_empty() {
            return Err(ApiError::config(
                "SUPABASE_ANON_KEY is not configured in window.ENV",
            ));
        }
        Ok(())
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> ApiResult<reqwest::Response> {
        self.ensure_configured()?;
        let res = self
            .with_auth_headers(req)
            .send()
            .await
            .map_err(ApiError::network)?;
        if res.status().is_success() {
            Ok(res)
        } else {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> ApiResult<T> {
        self.send(req).await?.json().await.map_err(ApiError::parse)
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}{}", self.config.supabase_url, path)
    }

    pub async fn select<T: DeserializeOwned>(&self, query: &Query) -> ApiResult<Vec<T>> {
        if query.matches_nothing() {
            return Ok(Vec::new());
        }
        let req = reqwest::Client::new().get(self.rest_url(&query.path()));
        self.send_json(req).await
    }

    pub async fn insert<B: Serialize, T: DeserializeOwned>(
        &self,
        table: Table,
        row: &B,
    ) -> ApiResult<T> {
        let req = reqwest::Client::new()
            .post(self.rest_url(&Query::table(table).path()))
            .header("Prefer", "return=representation")
            .json(row);
        let rows: Vec<T> = self.send_json(req).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ApiError::parse(format!("Insert into {table} returned no row")))
    }

    pub async fn update<B: Serialize, T: DeserializeOwned>(
        &self,
        query: &Query,
        patch: &B,
    ) -> ApiResult<Vec<T>> {
        let req = reqwest::Client::new()
            .patch(self.rest_url(&query.path()))
            .header("Prefer", "return=representation")
            .json(patch);
        self.send_json(req).await
    }

    async fn update_one<B: Serialize, T: DeserializeOwned>(
        &self,
        table: Table,
        id: &str,
        patch: &B,
    ) -> ApiResult<T> {
        let rows: Vec<T> = self.update(&Query::table(table).eq("id", id), patch).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ApiError::unauthorized(format!("No {table} row {id} to update")))
    }

    pub async fn delete_step(&self, step: &DeleteStep) -> ApiResult<()> {
        let req = reqwest::Client::new().delete(self.rest_url(&step.path()));
        self.send(req).await.map(|_| ())
    }

    /// Runs each step in order and stops at the first failure; earlier steps
    /// stay applied.
    pub async fn run_cascade(&self, plan: &CascadePlan) -> ApiResult<()> {
        for step in plan.effective_steps() {
            self.delete_step(step).await?;
        }
        Ok(())
    }

    pub async fn get_lists(&self, user_id: &str) -> ApiResult<Vec<List>> {
        self.select(
            &Query::table(Table::List)
                .eq("user_id", user_id)
                .order("created_at", true),
        )
        .await
    }

    pub async fn get_list(&self, list_id: &str) -> ApiResult<Option<List>> {
        let rows: Vec<List> = self
            .select(&Query::table(Table::List).eq("id", list_id).limit(1))
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Insert a list plus its "General" collection. The collection insert is
    /// best effort: a failure is logged and the list is still returned.
    pub async fn create_list(&self, row: &NewList) -> ApiResult<(List, Option<Collection>)> {
        let (list, general) = with_follow_up(
            self.insert::<_, List>(Table::List, row),
            |list: &List| {
                let general = NewCollection::general(&list.id);
                async move { self.create_collection(&general).await }
            },
        )
        .await?;
        let general = match general {
            Ok(c) => Some(c),
            Err(e) => {
                leptos::logging::error!("Failed to create default collection for {}: {e}", list.id);
                None
            }
        };
        Ok((list, general))
    }

    pub async fn update_list(&self, list_id: &str, patch: &ListPatch) -> ApiResult<List> {
        self.update_one(Table::List, list_id, patch).await
    }

    pub async fn delete_list(&self, list_id: &str) -> ApiResult<()> {
        let collection_ids: Vec<String> = self
            .get_collections(list_id)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();
        self.run_cascade(&CascadePlan::list(list_id, &collection_ids)).await
    }

    pub async fn get_collections(&self, list_id: &str) -> ApiResult<Vec<Collection>> {
        self.select(
            &Query::table(Table::Collection)
                .eq("list_id", list_id)
                .order("created_at", true),
        )
        .await
    }

    /// Case-insensitive lookup used by the collection popup's uniqueness check.
    pub async fn find_collections_named(
        &self,
        list_id: &str,
        name: &str,
    ) -> ApiResult<Vec<Collection>> {
        self.select(
            &Query::table(Table::Collection)
                .eq("list_id", list_id)
                .ilike_exact("name", name.trim()),
        )
        .await
    }

    pub async fn create_collection(&self, row: &NewCollection) -> ApiResult<Collection> {
        self.insert(Table::Collection, row).await
    }

    pub async fn update_collection(
        &self,
        collection_id: &str,
        patch: &CollectionPatch,
    ) -> ApiResult<Collection> {
        self.update_one(Table::Collection, collection_id, patch).await
    }

    /// Clear the flag on every other default in the list, then set it here.
    pub async fn make_default_collection(
        &self,
        known: &[Collection],
        list_id: &str,
        collection_id: &str,
    ) -> ApiResult<Collection> {
        let unset = defaults_to_unset(known, list_id, collection_id);
        if !unset.is_empty() {
            let clear = CollectionPatch {
                is_default: Some(false),
                ..Default::default()
            };
            let _: Vec<Collection> = self
                .update(&Query::table(Table::Collection).in_list("id", unset), &clear)
                .await?;
        }
        self.update_collection(
            collection_id,
            &CollectionPatch {
                is_default: Some(true),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn delete_collection(&self, collection_id: &str) -> ApiResult<()> {
        self.run_cascade(&CascadePlan::collection(collection_id)).await
    }

    pub async fn get_tasks_in(&self, collection_ids: &[String]) -> ApiResult<Vec<Task>> {
        self.select(
            &Query::table(Table::Task)
                .in_list("collection_id", collection_ids.iter().cloned())
                .eq("is_deleted", "false")
                .order("created_at", true),
        )
        .await
    }

    pub async fn get_user_tasks(&self, user_id: &str) -> ApiResult<Vec<Task>> {
        self.select(
            &Query::table(Table::Task)
                .eq("user_id", user_id)
                .eq("is_deleted", "false")
                .order("created_at", true),
        )
        .await
    }

    pub async fn create_task(&self, row: &NewTask) -> ApiResult<Task> {
        self.insert(Table::Task, row).await
    }

    pub async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> ApiResult<Task> {
        self.update_one(Table::Task, task_id, patch).await
    }

    /// Soft delete; filtered views and list pages skip `is_deleted` rows.
    pub async fn delete_task(&self, task_id: &str) -> ApiResult<Task> {
        self.update_task(
            task_id,
            &TaskPatch {
                is_deleted: Some(true),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn get_notes_in(&self, collection_ids: &[String]) -> ApiResult<Vec<Note>> {
        self.select(
            &Query::table(Table::Note)
                .in_list("collection_id", collection_ids.iter().cloned())
                .eq("is_deleted", "false")
                .order("created_at", true),
        )
        .await
    }

    pub async fn create_note(&self, row: &NewNote) -> ApiResult<Note> {
        self.insert(Table::Note, row).await
    }

    pub async fn update_note(&self, note_id: &str, patch: &NotePatch) -> ApiResult<Note> {
        self.update_one(Table::Note, note_id, patch).await
    }

    pub async fn delete_note(&self, note_id: &str) -> ApiResult<()> {
        self.delete_step(&DeleteStep {
            table: Table::Note,
            filter: listit_core::postgrest::Filter::eq("id", note_id),
        })
        .await
    }

    /// Calls the site's own account endpoint, which holds the service key.
    pub async fn delete_account(&self, user_id: &str) -> ApiResult<()> {
        let url = format!("{}{}", self.config.site_url, DELETE_ACCOUNT_API);
        let req = reqwest::Client::new()
            .delete(url)
            .json(&serde_json::json!({ "userId": user_id }));
        let reply: DeleteAccountReply = self.send_json(req).await?;
        if reply.success {
            Ok(())
        } else {
            Err(ApiError::parse("Account deletion did not report success"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new(EnvConfig::with_values(
            "https://demo.supabase.co/".to_string(),
            "anon-key".to_string(),
            "https://listit.app/".to_string(),
        ))
    }

    #[test]
    fn env_config_trims_trailing_slashes() {
        let c = client();
        assert_eq!(c.config.supabase_url, "https://demo.supabase.co");
        assert_eq!(c.site_url(), "https://listit.app");
        assert_eq!(c.auth_url(), "https://demo.supabase.co/auth/v1");
    }

    #[test]
    fn auth_header_falls_back_to_anon_key() {
        let c = client();
        assert!(!c.is_authenticated());
        assert_eq!(c.get_auth_header(), "Bearer anon-key");
        assert!(c.user_id().is_none());
    }

    #[test]
    fn auth_header_uses_session_token() {
        let mut c = client();
        c.set_session(Some(AuthSession {
            access_token: "jwt".into(),
            refresh_token: "r".into(),
            expires_at: 0,
            user: listit_core::AuthUser {
                id: "u1".into(),
                email: None,
                display_name: None,
                avatar_url: None,
            },
        }));
        assert_eq!(c.get_auth_header(), "Bearer jwt");
        assert_eq!(c.user_id().as_deref(), Some("u1"));
    }

    #[test]
    fn rate_limit_errors_carry_wait_time() {
        let err = ApiError::from_status(
            429,
            r#"{"msg":"For security purposes, you can only request this after 42 seconds."}"#,
        );
        assert_eq!(err.kind, ApiErrorKind::RateLimited);
        assert_eq!(err.wait_seconds(), Some(42));
    }

    #[test]
    fn http_errors_use_backend_message() {
        let err = ApiError::from_status(400, r#"{"error_description":"Invalid login credentials"}"#);
        assert_eq!(err.kind, ApiErrorKind::Http);
        assert_eq!(err.to_string(), "Invalid login credentials");
        assert!(err.wait_seconds().is_none());
        assert_eq!(ApiError::from_status(401, "").kind, ApiErrorKind::Unauthorized);
    }
}
