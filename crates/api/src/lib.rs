//! HTTP services with observability for the hotel booking system.
//!
//! Two services share this crate:
//! - the hotel service owns rooms and exposes availability confirmation,
//!   release and load-balanced room selection;
//! - the booking service owns bookings and runs the booking saga against the
//!   hotel service, either over HTTP or embedded in-process.
//!
//! Both carry structured logging (tracing), a correlation ID per request and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod telemetry;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use booking::{BookingStore, InMemoryBookingStore, PostgresBookingStore};
use inventory::{AvailabilityCoordinator, InMemoryRoomStore, PostgresRoomStore};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{
    BookingSaga, HttpRoomService, InProcessRoomService, ResilientRoomService, RoomService,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use error::StartupError;
use routes::bookings::BookingState;
use routes::rooms::{HotelState, SharedRoomStore};

const MAX_DB_CONNECTIONS: u32 = 10;

/// Creates the hotel service router.
pub fn create_hotel_app(state: Arc<HotelState>, metrics_handle: PrometheusHandle) -> Router {
    let api = Router::new()
        .route(
            "/api/v1/rooms",
            get(routes::rooms::list_available).post(routes::rooms::create),
        )
        .route("/api/v1/rooms/recommend", get(routes::rooms::recommend))
        .route("/api/v1/rooms/select", get(routes::rooms::select))
        .route(
            "/api/v1/rooms/{id}",
            get(routes::rooms::get).put(routes::rooms::update),
        )
        .route(
            "/api/v1/rooms/{id}/confirm-availability",
            post(routes::rooms::confirm_availability),
        )
        .route("/api/v1/rooms/{id}/release", post(routes::rooms::release))
        .with_state(state);

    with_common_layers(api, metrics_handle)
}

/// Creates the booking service router.
pub fn create_booking_app(state: Arc<BookingState>, metrics_handle: PrometheusHandle) -> Router {
    let api = Router::new()
        .route(
            "/api/v1/bookings",
            get(routes::bookings::list).post(routes::bookings::create),
        )
        .route(
            "/api/v1/bookings/{id}",
            get(routes::bookings::get).delete(routes::bookings::cancel),
        )
        .with_state(state);

    with_common_layers(api, metrics_handle)
}

fn with_common_layers(api: Router, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .merge(api)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(middleware::correlation_middleware))
}

/// Creates hotel service state over an in-memory room store.
pub fn in_memory_hotel_state(config: &Config) -> Arc<HotelState> {
    Arc::new(HotelState::new(
        Arc::new(InMemoryRoomStore::new()),
        config.cache_config(),
    ))
}

/// Creates booking service state from its parts.
pub fn booking_state(
    bookings: Arc<dyn BookingStore>,
    rooms: Arc<dyn RoomService>,
    config: &Config,
) -> Arc<BookingState> {
    Arc::new(BookingState {
        saga: BookingSaga::new(bookings, rooms, config.saga_config()),
    })
}

/// Builds hotel service state from configuration.
///
/// Uses PostgreSQL when `DATABASE_URL` is set, running migrations first.
pub async fn build_hotel_state(config: &Config) -> Result<Arc<HotelState>, StartupError> {
    let store: SharedRoomStore = match &config.database_url {
        Some(url) => {
            let store = PostgresRoomStore::new(connect(url).await?);
            store.run_migrations().await?;
            tracing::info!("using PostgreSQL room store");
            Arc::new(store)
        }
        None => {
            tracing::info!("using in-memory room store");
            Arc::new(InMemoryRoomStore::new())
        }
    };
    Ok(Arc::new(HotelState::new(store, config.cache_config())))
}

/// Builds booking service state from configuration.
///
/// With `HOTEL_SERVICE_URL` set, the hotel service is called over HTTP
/// behind timeouts, retries and a circuit breaker. Otherwise the room owner
/// runs in-process over an in-memory room store.
pub async fn build_booking_state(config: &Config) -> Result<Arc<BookingState>, StartupError> {
    let bookings: Arc<dyn BookingStore> = match &config.database_url {
        Some(url) => {
            let store = PostgresBookingStore::new(connect(url).await?);
            store.run_migrations().await?;
            tracing::info!("using PostgreSQL booking store");
            Arc::new(store)
        }
        None => {
            tracing::info!("using in-memory booking store");
            Arc::new(InMemoryBookingStore::new())
        }
    };

    let rooms: Arc<dyn RoomService> = match &config.hotel_service_url {
        Some(url) => {
            tracing::info!(%url, "calling hotel service over HTTP");
            Arc::new(ResilientRoomService::new(
                HttpRoomService::new(url)?,
                config.resilience_config(),
            ))
        }
        None => {
            tracing::info!("running room owner in-process");
            let store: SharedRoomStore = Arc::new(InMemoryRoomStore::new());
            let coordinator = Arc::new(AvailabilityCoordinator::with_cache_config(
                store,
                config.cache_config(),
            ));
            Arc::new(InProcessRoomService::new(coordinator))
        }
    };

    Ok(booking_state(bookings, rooms, config))
}

async fn connect(url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_DB_CONNECTIONS)
        .connect(url)
        .await
}
