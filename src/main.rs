use anyhow::Context;
use event_booking_server::{config::Config, db::init_db_pool, handlers::router, state::AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let pool = init_db_pool(&config).await?;
    let app = router(AppState::new(pool, &config));

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Starting event booking server on {}...", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
