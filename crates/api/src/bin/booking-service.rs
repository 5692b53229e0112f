//! Booking service entry point.

use api::config::{BOOKING_SERVICE_PORT, Config};
use api::error::StartupError;

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env(BOOKING_SERVICE_PORT);
    api::telemetry::init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = api::telemetry::install_metrics()?;

    // 3. Build the booking store, room service and saga
    let state = api::build_booking_state(&config).await.inspect_err(|e| {
        tracing::error!(error = %e, "failed to initialise booking service");
    })?;

    // 4. Build the application and serve
    let app = api::create_booking_app(state, metrics_handle);
    api::server::serve(app, &config.addr(), "booking-service").await?;
    Ok(())
}
