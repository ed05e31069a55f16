use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::HeaderMap;
use axum::Json;
use listit_core::cascade::CascadePlan;
use listit_core::models::Table;
use listit_core::postgrest::Query;
use listit_core::session::{cookie_value, ACCESS_TOKEN_COOKIE};
use serde::{Deserialize, Serialize};

use crate::backend::AdminBackend;
use crate::error::AppError;
use crate::middleware::header_string;
use crate::routes::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteAccountRequest {
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteAccountResponse {
    pub success: bool,
}

/// `DELETE /api/delete-account` with `{ "userId": "..." }`.
///
/// The caller must also prove it owns the account: an access token for the
/// same user, sent as `Authorization: Bearer` or in the session cookie.
/// Without one the reply is 401, with another user's token 403. Only then
/// is the service key used to purge the rows and the auth user.
pub async fn delete_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DeleteAccountResponse>, AppError> {
    let request: DeleteAccountRequest = serde_json::from_slice(&body).unwrap_or_default();
    let user_id = request
        .user_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("userId is required"))?;

    let admin = state.admin.as_ref().ok_or_else(|| {
        tracing::error!("Account deletion requested without a service role key");
        AppError::Config("Server is missing the service role key".to_string())
    })?;

    let access_token =
        caller_token(&headers).ok_or_else(|| AppError::unauthorized("Missing access token"))?;
    let caller = state.auth.user_for_token(&access_token).await?;
    if caller.id != user_id {
        tracing::warn!(caller = %caller.id, target = %user_id, "Refused to delete another account");
        return Err(AppError::Forbidden(
            "Accounts can only be deleted by their owner".to_string(),
        ));
    }

    let errors = purge_account(admin.as_ref(), &user_id).await;
    if !errors.is_empty() {
        tracing::error!(user_id = %user_id, failures = errors.len(), "Account deletion incomplete");
        return Err(AppError::Incomplete(errors));
    }

    tracing::info!(user_id = %user_id, "Account deleted");
    Ok(Json(DeleteAccountResponse { success: true }))
}

/// Bearer header first, then the session cookie.
fn caller_token(headers: &HeaderMap) -> Option<String> {
    header_string(headers, AUTHORIZATION)
        .and_then(|value| value.strip_prefix("Bearer ").map(str::to_string))
        .or_else(|| {
            header_string(headers, COOKIE).and_then(|c| cookie_value(&c, ACCESS_TOKEN_COOKIE))
        })
        .filter(|token| !token.is_empty())
}

/// Run every delete step and the auth-user removal, collecting failures
/// instead of stopping at the first one.
pub(crate) async fn purge_account(admin: &dyn AdminBackend, user_id: &str) -> Vec<String> {
    let mut errors = Vec::new();

    let list_ids = admin
        .select_ids(&Query::table(Table::List).select("id").eq("user_id", user_id))
        .await
        .unwrap_or_else(|err| {
            errors.push(format!("list lookup: {err}"));
            Vec::new()
        });
    let collection_ids = admin
        .select_ids(
            &Query::table(Table::Collection)
                .select("id")
                .in_list("list_id", list_ids.iter().cloned()),
        )
        .await
        .unwrap_or_else(|err| {
            errors.push(format!("collection lookup: {err}"));
            Vec::new()
        });

    let plan = CascadePlan::account(user_id, &list_ids, &collection_ids);
    for step in plan.effective_steps() {
        if let Err(err) = admin.delete_rows(step).await {
            tracing::warn!(table = %step.table, error = %err, "Delete step failed");
            errors.push(format!("{}: {err}", step.table));
        }
    }

    if let Err(err) = admin.delete_auth_user(user_id).await {
        errors.push(format!("auth user: {err}"));
    }
    errors
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::routing::delete;
    use axum::Router;
    use http_body_util::BodyExt;
    use listit_core::cascade::DeleteStep;
    use listit_core::{AuthSession, AuthUser};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::backend::AuthBackend;
    use crate::config::ServerConfig;

    struct FakeAuth;

    #[async_trait]
    impl AuthBackend for FakeAuth {
        async fn user_for_token(&self, access_token: &str) -> Result<AuthUser, AppError> {
            match access_token {
                "token-u1" => Ok(AuthUser {
                    id: "u1".into(),
                    email: Some("a@b.co".into()),
                    display_name: None,
                    avatar_url: None,
                }),
                _ => Err(AppError::unauthorized("invalid token")),
            }
        }

        async fn refresh(&self, _refresh_token: &str) -> Result<AuthSession, AppError> {
            Err(AppError::unauthorized("unused"))
        }

        async fn exchange_code(&self, _code: &str, _verifier: &str) -> Result<AuthSession, AppError> {
            Err(AppError::unauthorized("unused"))
        }
    }

    #[derive(Default)]
    struct FakeAdmin {
        deleted: Mutex<Vec<String>>,
        failing_table: Option<Table>,
    }

    #[async_trait]
    impl AdminBackend for FakeAdmin {
        async fn select_ids(&self, query: &Query) -> Result<Vec<String>, AppError> {
            Ok(match query.table_name() {
                Table::List => vec!["l1".into()],
                Table::Collection => vec!["c1".into(), "c2".into()],
                _ => Vec::new(),
            })
        }

        async fn delete_rows(&self, step: &DeleteStep) -> Result<(), AppError> {
            if self.failing_table == Some(step.table) {
                return Err(AppError::external("permission denied"));
            }
            self.deleted.lock().unwrap().push(step.path());
            Ok(())
        }

        async fn delete_auth_user(&self, user_id: &str) -> Result<(), AppError> {
            self.deleted.lock().unwrap().push(format!("auth:{user_id}"));
            Ok(())
        }
    }

    fn app(admin: Option<Arc<FakeAdmin>>) -> Router {
        let config = ServerConfig::from_lookup(|key| match key {
            "SUPABASE_URL" => Some("http://localhost:54321".into()),
            "SUPABASE_ANON_KEY" => Some("anon".into()),
            _ => None,
        })
        .unwrap();
        let state = AppState {
            config: Arc::new(config),
            auth: Arc::new(FakeAuth),
            admin: admin.map(|a| a as Arc<dyn AdminBackend>),
        };
        Router::new()
            .route("/api/delete-account", delete(delete_account))
            .with_state(state)
    }

    async fn call(app: Router, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::DELETE)
            .uri("/api/delete-account")
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let response = app
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_user_id_is_bad_request() {
        let (status, body) = call(app(Some(Arc::default())), Some("token-u1"), json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("userId"));
    }

    #[tokio::test]
    async fn missing_service_key_is_server_error() {
        let (status, _) = call(app(None), Some("token-u1"), json!({ "userId": "u1" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn other_users_account_is_forbidden() {
        let admin = Arc::new(FakeAdmin::default());
        let (status, _) = call(app(Some(admin.clone())), Some("token-u1"), json!({ "userId": "u2" })).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(admin.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unauthenticated_caller_is_rejected() {
        let (status, _) = call(app(Some(Arc::default())), None, json!({ "userId": "u1" })).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn session_cookie_identifies_the_owner() {
        let admin = Arc::new(FakeAdmin::default());
        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/api/delete-account")
            .header("content-type", "application/json")
            .header("cookie", "isLoggedIn=true; listit-access-token=token-u1")
            .body(Body::from(json!({ "userId": "u1" }).to_string()))
            .unwrap();
        let response = app(Some(admin.clone())).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(admin.deleted.lock().unwrap().iter().any(|d| d == "auth:u1"));
    }

    #[tokio::test]
    async fn deletes_all_rows_then_auth_user() {
        let admin = Arc::new(FakeAdmin::default());
        let (status, body) = call(app(Some(admin.clone())), Some("token-u1"), json!({ "userId": "u1" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let deleted = admin.deleted.lock().unwrap();
        assert_eq!(deleted.first().map(String::as_str), Some("/rest/v1/task?user_id=eq.u1"));
        assert!(deleted.contains(&"/rest/v1/collection?list_id=in.%28l1%29".to_string()));
        assert_eq!(deleted.last().map(String::as_str), Some("auth:u1"));
    }

    #[tokio::test]
    async fn failed_steps_are_aggregated() {
        let admin = Arc::new(FakeAdmin {
            failing_table: Some(Table::Note),
            ..FakeAdmin::default()
        });
        let (status, body) = call(app(Some(admin.clone())), Some("token-u1"), json!({ "userId": "u1" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let details = body["details"].as_array().unwrap();
        assert_eq!(details.len(), 1);
        assert!(details[0].as_str().unwrap().starts_with("note:"));
        // Later steps still ran.
        assert!(admin.deleted.lock().unwrap().iter().any(|d| d == "auth:u1"));
    }
}
