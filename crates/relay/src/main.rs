//! Harborview chat relay server

use anyhow::Context;
use harborview_relay::{routes, AppState, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    let pool =
        harborview_shared::create_pool(&config.database_url, config.database_max_connections)
            .await
            .context("failed to connect to database")?;
    harborview_shared::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let bind_address = config.bind_address.clone();
    let state = AppState::new(config, pool);
    let public_url = state.config.public_url.clone();
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    tracing::info!(
        address = %bind_address,
        public_url = %public_url,
        "Harborview chat relay listening"
    );

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
