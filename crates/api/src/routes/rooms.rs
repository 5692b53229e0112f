//! Hotel service endpoints: room reads, availability confirmation and release.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{
    AvailabilityConfirmation, ConfirmAvailability, HotelId, RequestId, RoomId, RoomSummary,
    RoomType,
};
use inventory::{
    AvailabilityCoordinator, NewRoom, OutcomeCacheConfig, RoomDetails, RoomSelector, RoomStore,
};
use serde::Deserialize;

use crate::error::ApiError;

/// Room store shared by the hotel service, whichever backend is configured.
pub type SharedRoomStore = Arc<dyn RoomStore>;

/// Shared state of the hotel service.
pub struct HotelState {
    pub coordinator: Arc<AvailabilityCoordinator<SharedRoomStore>>,
    pub selector: RoomSelector<SharedRoomStore>,
}

impl HotelState {
    pub fn new(store: SharedRoomStore, cache: OutcomeCacheConfig) -> Self {
        let coordinator = Arc::new(AvailabilityCoordinator::with_cache_config(store, cache));
        let selector = RoomSelector::new(Arc::clone(&coordinator));
        Self {
            coordinator,
            selector,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectQuery {
    pub hotel_id: i64,
    pub room_type: String,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseQuery {
    pub request_id: String,
}

fn summaries(rooms: Vec<inventory::Room>) -> Vec<RoomSummary> {
    rooms.iter().map(|r| r.summary()).collect()
}

/// GET /api/v1/rooms — list available rooms.
#[tracing::instrument(skip(state))]
pub async fn list_available(
    State(state): State<Arc<HotelState>>,
) -> Result<Json<Vec<RoomSummary>>, ApiError> {
    let rooms = state.coordinator.available_rooms().await?;
    Ok(Json(summaries(rooms)))
}

/// POST /api/v1/rooms — create a room.
#[tracing::instrument(skip(state, room))]
pub async fn create(
    State(state): State<Arc<HotelState>>,
    Json(room): Json<NewRoom>,
) -> Result<(StatusCode, Json<RoomSummary>), ApiError> {
    let room = state.coordinator.create_room(room).await?;
    Ok((StatusCode::CREATED, Json(room.summary())))
}

/// GET /api/v1/rooms/{id} — load a room.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<HotelState>>,
    Path(id): Path<RoomId>,
) -> Result<Json<RoomSummary>, ApiError> {
    let room = state.coordinator.get_room(id).await?;
    Ok(Json(room.summary()))
}

/// PUT /api/v1/rooms/{id} — update room details. The load counter is never
/// changed here.
#[tracing::instrument(skip(state, details))]
pub async fn update(
    State(state): State<Arc<HotelState>>,
    Path(id): Path<RoomId>,
    Json(details): Json<RoomDetails>,
) -> Result<Json<RoomSummary>, ApiError> {
    let room = state.coordinator.update_room(id, details).await?;
    Ok(Json(room.summary()))
}

/// GET /api/v1/rooms/recommend — available rooms, least loaded first.
#[tracing::instrument(skip(state))]
pub async fn recommend(
    State(state): State<Arc<HotelState>>,
) -> Result<Json<Vec<RoomSummary>>, ApiError> {
    let rooms = state.selector.recommend().await?;
    Ok(Json(summaries(rooms)))
}

/// GET /api/v1/rooms/select?hotel_id=&room_type= — pick the least loaded room.
#[tracing::instrument(skip(state))]
pub async fn select(
    State(state): State<Arc<HotelState>>,
    Query(query): Query<SelectQuery>,
) -> Result<Json<RoomSummary>, ApiError> {
    let room_type: RoomType = query.room_type.parse()?;
    let room = state
        .selector
        .select_optimal(HotelId::new(query.hotel_id), room_type)
        .await?;
    Ok(Json(room.summary()))
}

/// POST /api/v1/rooms/{id}/confirm-availability — reserve a room for one
/// reservation attempt. A denial is a successful response with
/// `confirmed = false`.
#[tracing::instrument(skip(state, request), fields(request_id = %request.request_id))]
pub async fn confirm_availability(
    State(state): State<Arc<HotelState>>,
    Path(id): Path<RoomId>,
    Json(request): Json<ConfirmAvailability>,
) -> Result<Json<AvailabilityConfirmation>, ApiError> {
    let dates = request.dates();
    let outcome = state
        .coordinator
        .confirm(id, request.request_id, dates)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/rooms/{id}/release?request_id= — release a reserved slot.
#[tracing::instrument(skip(state))]
pub async fn release(
    State(state): State<Arc<HotelState>>,
    Path(id): Path<RoomId>,
    Query(query): Query<ReleaseQuery>,
) -> Result<Json<RoomSummary>, ApiError> {
    if query.request_id.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "request_id must not be empty".to_string(),
        ));
    }
    let room = state
        .coordinator
        .release(id, RequestId::new(query.request_id))
        .await?;
    Ok(Json(room.summary()))
}
