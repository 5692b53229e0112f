//! Helpers shared by the API test binaries.

#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use api::config::Config;
use api::routes::bookings::BookingState;
use api::routes::rooms::HotelState;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use booking::InMemoryBookingStore;
use common::{HotelId, RoomId, RoomType};
use inventory::{AvailabilityCoordinator, InMemoryRoomStore, NewRoom};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::InProcessRoomService;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            api::telemetry::install_metrics().expect("failed to install Prometheus recorder")
        })
        .clone()
}

/// Hotel service backed by an in-memory room store.
pub struct HotelHarness {
    pub app: Router,
    pub state: Arc<HotelState>,
}

impl HotelHarness {
    pub fn new() -> Self {
        let state = api::in_memory_hotel_state(&Config::default());
        let app = api::create_hotel_app(Arc::clone(&state), metrics_handle());
        Self { app, state }
    }

    pub async fn add_room(&self, number: &str, room_type: RoomType) -> RoomId {
        self.state
            .coordinator
            .create_room(NewRoom::new(HotelId::new(1), number, room_type, 15_000))
            .await
            .unwrap()
            .id()
    }

    pub async fn times_booked(&self, room_id: RoomId) -> u32 {
        self.state
            .coordinator
            .get_room(room_id)
            .await
            .unwrap()
            .times_booked()
    }
}

/// Booking service with the room owner embedded in-process.
pub struct BookingHarness {
    pub app: Router,
    pub bookings: InMemoryBookingStore,
    pub rooms: InProcessRoomService<InMemoryRoomStore>,
    pub room_store: InMemoryRoomStore,
}

impl BookingHarness {
    pub fn new() -> Self {
        let room_store = InMemoryRoomStore::new();
        let rooms = InProcessRoomService::new(Arc::new(AvailabilityCoordinator::new(
            room_store.clone(),
        )));
        let bookings = InMemoryBookingStore::new();
        let state: Arc<BookingState> = api::booking_state(
            Arc::new(bookings.clone()),
            Arc::new(rooms.clone()),
            &Config::default(),
        );
        let app = api::create_booking_app(state, metrics_handle());
        Self {
            app,
            bookings,
            rooms,
            room_store,
        }
    }

    pub async fn add_room(&self, number: &str, room_type: RoomType, times_booked: u32) -> RoomId {
        self.room_store
            .seed(
                NewRoom::new(HotelId::new(1), number, room_type, 15_000),
                times_booked,
            )
            .await
            .unwrap()
            .id()
    }

    pub async fn times_booked(&self, room_id: RoomId) -> u32 {
        self.rooms
            .coordinator()
            .get_room(room_id)
            .await
            .unwrap()
            .times_booked()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn as_user(
    user_id: i64,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", user_id.to_string());
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    read_json(response).await
}

pub async fn read_json(response: Response) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

pub fn stay() -> serde_json::Value {
    serde_json::json!({ "start_date": "2025-05-01", "end_date": "2025-05-04" })
}

pub fn booking_body(room_id: RoomId) -> serde_json::Value {
    let mut body = stay();
    body["room_id"] = serde_json::json!(room_id.as_i64());
    body
}
