mod analytics;
mod api;
mod catalog;
mod cli;
mod config;
mod db;
mod dedup;
mod ingest;
mod models;
mod populate;
mod schema;
mod source;

use anyhow::Result;
use config::Config;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metacritic_catalog=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let args = std::env::args().collect::<Vec<_>>();
    if cli::maybe_run_from_cli(&args, &config)? {
        return Ok(());
    }

    if !config.db_path.exists() {
        warn!(
            db = %config.db_path.display(),
            "Catalog database not found; run `metacritic-catalog ingest` first"
        );
    }

    let state = AppState {
        config: config.clone(),
    };
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("metacritic-catalog listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
