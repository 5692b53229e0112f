//! Hotel service entry point.

use api::config::{Config, HOTEL_SERVICE_PORT};
use api::error::StartupError;

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env(HOTEL_SERVICE_PORT);
    api::telemetry::init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = api::telemetry::install_metrics()?;

    // 3. Build the room store and coordinator
    let state = api::build_hotel_state(&config).await.inspect_err(|e| {
        tracing::error!(error = %e, "failed to initialise hotel service");
    })?;

    // 4. Build the application and serve
    let app = api::create_hotel_app(state, metrics_handle);
    api::server::serve(app, &config.addr(), "hotel-service").await?;
    Ok(())
}
