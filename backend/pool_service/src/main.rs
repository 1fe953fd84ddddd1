//! Scholarship pool service: entry point.
//!
//! Runs the pool engine in-process, persisting every committed operation
//! (store snapshot + emitted events) to SQLite, and exposes it through an
//! Axum REST API for the frontend and pool administrators.

mod api;
mod config;
mod db;
mod errors;
mod events;
mod rpc;
mod state;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    // Set up the SQLite connection pool and run migrations.
    let pool = db::init_pool(&config.database_url).await?;

    // HTTP client for the RPC network probe.
    let client = rpc::build_client(config.rpc_timeout_secs)?;

    let state = AppState::load(pool, config.clone(), client).await?;

    let app = api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
