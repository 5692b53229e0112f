//! Booking service endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use booking::{Booking, BookingStore, DEFAULT_PAGE_LIMIT, Page};
use chrono::NaiveDate;
use common::{BookingId, DateRange, HotelId, RoomId, RoomType};
use saga::{BookingSaga, CreateBooking, RoomChoice, RoomService};
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::{AuthenticatedUser, IdempotencyKey};

/// Booking saga wired to whichever store and room service are configured.
pub type SharedBookingSaga = BookingSaga<Arc<dyn BookingStore>, Arc<dyn RoomService>>;

/// Shared state of the booking service.
pub struct BookingState {
    pub saga: SharedBookingSaga,
}

// -- Request types --

/// Body of `POST /api/v1/bookings`.
///
/// Either `room_id`, or `hotel_id` together with `room_type` to let the
/// service pick the least loaded room.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub room_id: Option<RoomId>,
    pub hotel_id: Option<HotelId>,
    pub room_type: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl CreateBookingRequest {
    fn room_choice(&self) -> Result<RoomChoice, ApiError> {
        if let Some(room_id) = self.room_id {
            return Ok(RoomChoice::Specific(room_id));
        }
        match (self.hotel_id, self.room_type.as_deref()) {
            (Some(hotel_id), Some(room_type)) => {
                let room_type: RoomType = room_type.parse()?;
                Ok(RoomChoice::Auto {
                    hotel_id,
                    room_type,
                })
            }
            _ => Err(ApiError::BadRequest(
                "Either room_id or hotel_id and room_type must be provided".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

// -- Handlers --

/// POST /api/v1/bookings — create a booking and reserve its room.
#[tracing::instrument(skip(state, key, req))]
pub async fn create(
    State(state): State<Arc<BookingState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    IdempotencyKey(key): IdempotencyKey,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let cmd = CreateBooking {
        user_id,
        room: req.room_choice()?,
        dates: DateRange::new(req.start_date, req.end_date),
        idempotency_key: key,
    };
    let booking = state.saga.create_booking(cmd).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /api/v1/bookings?limit=&offset= — list the caller's bookings.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<BookingState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let page = Page::new(
        query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        query.offset.unwrap_or(0),
    );
    let bookings = state.saga.list_bookings(user_id, page).await?;
    Ok(Json(bookings))
}

/// GET /api/v1/bookings/{id} — load one of the caller's bookings.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<BookingState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<BookingId>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state.saga.get_booking(id, user_id).await?;
    Ok(Json(booking))
}

/// DELETE /api/v1/bookings/{id} — cancel a booking and release its room.
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<BookingState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<BookingId>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state.saga.cancel_booking(id, user_id).await?;
    Ok(Json(booking))
}
