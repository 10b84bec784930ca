use chute::{auth::SecretScheme, config::Config, store, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chute=info")),
        )
        .init();

    let config = Config::from_env()?;

    let db_pool = store::connect(&config.database_url, config.max_connections).await?;
    let app_state = AppState::new(db_pool, SecretScheme::new(config.anonymous_salt));

    let app = chute::router(app_state);
    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!("listening on {}", config.listen);
    axum::serve(listener, app).await?;
    Ok(())
}
