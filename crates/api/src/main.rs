use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use domain::services::{Clock, SystemClock};
use persistence::repositories::RideRepository;
use tracing::info;

use cride_api::config::Config;
use cride_api::{app, jobs, middleware};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    middleware::logging::init_logging(&config.logging);

    info!("Starting Comparte Ride API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    // The expiry sweep runs alongside the server on the same pool.
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let expiry = jobs::start_ride_expiry(
        RideRepository::new(pool.clone()),
        clock,
        config.jobs.ride_expiry_interval_secs,
    );

    let app = app::create_app(config.clone(), pool);

    let addr = config.socket_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    expiry.stop(Duration::from_secs(10)).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install shutdown signal handler");
        return;
    }
    info!("Shutdown signal received");
}
