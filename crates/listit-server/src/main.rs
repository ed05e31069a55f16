mod account;
mod backend;
mod callback;
mod config;
mod error;
mod middleware;
mod routes;
mod supabase;

use std::sync::Arc;

use config::ServerConfig;
use routes::{app_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("listit_server=info".parse().expect("valid directive")),
        )
        .init();

    let config = Arc::new(ServerConfig::from_env()?);
    tracing::info!("Starting listit-server with config: {:?}", config);
    if config.service_role_key.is_none() {
        tracing::warn!("SUPABASE_SERVICE_ROLE_KEY is not set; account deletion will fail");
    }

    let state = AppState::from_config(config)?;
    let bind_addr = state.config.bind_addr.clone();
    let router = app_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listit-server listening on {}", bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
