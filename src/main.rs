use actix_web::{middleware, web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod handlers;

use propscore::config::{ServerConfig, StrategyConfig};

/// Application state shared across handlers
#[derive(Debug, Default)]
pub struct AppState {
    /// Defaults applied when a request carries no overrides
    pub strategy: StrategyConfig,
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let strategy = config.load_strategy()?;
    let addr = format!("{}:{}", config.host, config.port);

    match &config.strategy_path {
        Some(path) => info!("Using strategy from {}", path.display()),
        None => info!("No PROPSCORE_CONFIG set, using default strategy"),
    }

    let app_state = Arc::new(AppState { strategy });

    info!("Starting Propscore API server at http://{}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .configure(handlers::configure)
    })
    .bind(&addr)
    .with_context(|| format!("Failed to bind {}", addr))?
    .run()
    .await
    .context("HTTP server terminated")
}
