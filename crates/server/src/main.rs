use polls::config::Config;
use polls::store::{MemoryStore, PgStore, Store};
use polls::{AppState, router};
use tracing_subscriber::EnvFilter;

// ===== Main =====

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")))
        .init();

    let config = Config::load()?;
    match config.database_url.clone() {
        Some(database_url) => {
            let store = PgStore::connect(&database_url, config.max_connections).await?;
            store.migrate().await?;
            tracing::info!("Connected to database, migrations applied");
            serve(store, config).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, records live in memory and vanish on exit");
            serve(MemoryStore::new(), config).await
        }
    }
}

async fn serve<S: Store>(store: S, config: Config) -> anyhow::Result<()> {
    let state = AppState::new(store, config.admin.clone())?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("Server running on http://{}", config.bind_addr());

    axum::serve(listener, app).await?;
    Ok(())
}
