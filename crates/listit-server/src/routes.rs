use std::sync::Arc;

use axum::routing::{delete, get};
use axum::{middleware, Router};
use listit_core::routes::{AUTH_CALLBACK, DELETE_ACCOUNT_API};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::account::delete_account;
use crate::backend::{AdminBackend, AuthBackend};
use crate::callback::auth_callback;
use crate::config::ServerConfig;
use crate::middleware::route_guard;
use crate::supabase::{SupabaseAdmin, SupabaseAuth};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub auth: Arc<dyn AuthBackend>,
    pub admin: Option<Arc<dyn AdminBackend>>,
}

impl AppState {
    pub fn from_config(config: Arc<ServerConfig>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent("listit-server")
            .build()?;
        let auth: Arc<dyn AuthBackend> = Arc::new(SupabaseAuth::new(client.clone(), &config));
        let admin = SupabaseAdmin::from_config(client, &config)
            .map(|admin| Arc::new(admin) as Arc<dyn AdminBackend>);
        Ok(Self {
            config,
            auth,
            admin,
        })
    }
}

pub fn app_router(state: AppState) -> Router {
    // Unknown paths get the SPA shell so client-side routes survive a reload.
    let index = state.config.static_dir.join("index.html");
    let spa = ServeDir::new(&state.config.static_dir).fallback(ServeFile::new(index));

    Router::new()
        .route("/healthz", get(healthz))
        .route(DELETE_ACCOUNT_API, delete(delete_account))
        .route(AUTH_CALLBACK, get(auth_callback))
        .fallback_service(spa)
        .layer(middleware::from_fn_with_state(state.clone(), route_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}
