use async_trait::async_trait;
use listit_core::cascade::DeleteStep;
use listit_core::postgrest::Query;
use listit_core::{AuthSession, AuthUser};

use crate::error::AppError;

/// Calls made with the public key on behalf of a signed-in browser.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn user_for_token(&self, access_token: &str) -> Result<AuthUser, AppError>;
    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AppError>;
    async fn exchange_code(&self, auth_code: &str, code_verifier: &str)
        -> Result<AuthSession, AppError>;
}

/// Calls that need the service-role key and bypass row-level security.
#[async_trait]
pub trait AdminBackend: Send + Sync {
    /// `id` column of every row matching the query.
    async fn select_ids(&self, query: &Query) -> Result<Vec<String>, AppError>;
    async fn delete_rows(&self, step: &DeleteStep) -> Result<(), AppError>;
    async fn delete_auth_user(&self, user_id: &str) -> Result<(), AppError>;
}
