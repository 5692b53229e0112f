//! Booking saga orchestrator.

use std::time::Instant;

use booking::{Booking, BookingStatus, BookingStore, BookingStoreError, NewBooking, Page};
use common::{
    BookingId, ConfirmAvailability, DateRange, HotelId, RequestId, RoomId, RoomType, UserId,
};
use serde::{Deserialize, Serialize};

use crate::error::SagaError;
use crate::services::RoomService;

/// Message returned when a room cannot be reserved.
pub const ROOM_UNAVAILABLE: &str = "Room is not available for selected dates";

/// Message returned when a request ID already reserved a different room.
pub const KEY_USED_FOR_OTHER_ROOM: &str = "Idempotency key was already used for another room";

/// Tuning of [`BookingSaga`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaConfig {
    /// Longest stay, in nights, a single booking may cover.
    pub max_booking_days: u32,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            max_booking_days: 30,
        }
    }
}

/// Which room a booking should reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomChoice {
    /// A room picked by the caller.
    Specific(RoomId),
    /// The least loaded available room of the given hotel and type.
    Auto { hotel_id: HotelId, room_type: RoomType },
}

/// Request to create a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBooking {
    pub user_id: UserId,
    pub room: RoomChoice,
    pub dates: DateRange,
    /// Client-supplied idempotency key. A fresh request ID is minted when
    /// absent, in which case a retried call is a new reservation attempt.
    pub idempotency_key: Option<RequestId>,
}

impl CreateBooking {
    /// Creates a request for a specific room.
    pub fn for_room(user_id: UserId, room_id: RoomId, dates: DateRange) -> Self {
        Self {
            user_id,
            room: RoomChoice::Specific(room_id),
            dates,
            idempotency_key: None,
        }
    }

    /// Creates a request that lets the selector pick the room.
    pub fn auto(user_id: UserId, hotel_id: HotelId, room_type: RoomType, dates: DateRange) -> Self {
        Self {
            user_id,
            room: RoomChoice::Auto {
                hotel_id,
                room_type,
            },
            dates,
            idempotency_key: None,
        }
    }

    /// Sets the client-supplied idempotency key.
    pub fn with_idempotency_key(mut self, key: RequestId) -> Self {
        self.idempotency_key = Some(key);
        self
    }
}

/// Orchestrates booking creation across the booking store and the room owner.
///
/// Creating a booking reserves the room remotely, then commits the booking
/// locally as `CONFIRMED`. If the local commit fails after a successful
/// reservation, the reservation is released and the original error is
/// returned. Release failures are logged and counted but never retried.
pub struct BookingSaga<B, R>
where
    B: BookingStore,
    R: RoomService,
{
    bookings: B,
    rooms: R,
    config: SagaConfig,
}

impl<B, R> BookingSaga<B, R>
where
    B: BookingStore,
    R: RoomService,
{
    /// Creates a new booking saga.
    pub fn new(bookings: B, rooms: R, config: SagaConfig) -> Self {
        Self {
            bookings,
            rooms,
            config,
        }
    }

    /// Returns the booking store.
    pub fn bookings(&self) -> &B {
        &self.bookings
    }

    /// Returns the room service.
    pub fn rooms(&self) -> &R {
        &self.rooms
    }

    pub fn config(&self) -> &SagaConfig {
        &self.config
    }

    /// Creates a booking and reserves its room.
    ///
    /// Returns the existing booking when the idempotency key was already
    /// used by a completed attempt.
    #[tracing::instrument(skip(self, cmd), fields(user_id = %cmd.user_id, dates = %cmd.dates))]
    pub async fn create_booking(&self, cmd: CreateBooking) -> Result<Booking, SagaError> {
        metrics::counter!("booking_saga_executions_total").increment(1);
        let saga_start = Instant::now();

        let result = self.run_create(cmd).await;

        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("booking_saga_duration_seconds").record(duration);
        match &result {
            Ok(booking) => {
                metrics::counter!("booking_saga_completed_total").increment(1);
                tracing::info!(
                    booking_id = %booking.id,
                    room_id = %booking.room_id,
                    request_id = %booking.request_id,
                    duration,
                    "booking saga completed"
                );
            }
            Err(e) => {
                metrics::counter!("booking_saga_failed_total", "reason" => e.kind()).increment(1);
                tracing::warn!(error = %e, reason = e.kind(), duration, "booking saga failed");
            }
        }
        result
    }

    async fn run_create(&self, cmd: CreateBooking) -> Result<Booking, SagaError> {
        self.validate_dates(&cmd.dates)?;

        let request_id = match cmd.idempotency_key {
            Some(key) => {
                if let Some(existing) = self.bookings.find_by_request_id(&key).await? {
                    return Self::replay(existing, cmd.user_id);
                }
                key
            }
            None => RequestId::generate(),
        };

        let room_id = match cmd.room {
            RoomChoice::Specific(room_id) => room_id,
            RoomChoice::Auto {
                hotel_id,
                room_type,
            } => {
                let room = self.rooms.select_room(hotel_id, room_type).await?;
                tracing::info!(room_id = %room.id, times_booked = room.times_booked, "room selected");
                room.id
            }
        };

        let room = self.rooms.get_room(room_id).await?;
        if !room.available {
            return Err(SagaError::Validation(ROOM_UNAVAILABLE.to_string()));
        }

        tracing::info!(%room_id, %request_id, "reserving room");
        let confirmation = self
            .rooms
            .confirm(
                room_id,
                ConfirmAvailability::new(request_id.clone(), cmd.dates),
            )
            .await?;
        if confirmation.room_id != room_id {
            // The outcome belongs to an earlier attempt on another room; it
            // reserved nothing here and is not ours to release.
            tracing::warn!(
                %room_id,
                confirmed_room_id = %confirmation.room_id,
                "confirmation is for a different room"
            );
            return Err(SagaError::Validation(KEY_USED_FOR_OTHER_ROOM.to_string()));
        }
        if !confirmation.confirmed {
            tracing::info!(%room_id, message = %confirmation.message, "reservation denied");
            return Err(SagaError::Validation(ROOM_UNAVAILABLE.to_string()));
        }

        let new_booking =
            NewBooking::confirmed(cmd.user_id, room_id, cmd.dates, request_id.clone());
        match self.bookings.insert(new_booking).await {
            Ok(booking) => Ok(booking),
            Err(BookingStoreError::DuplicateRequestId(_)) => {
                // A concurrent attempt with the same key committed first and
                // owns the reservation.
                match self.bookings.find_by_request_id(&request_id).await? {
                    Some(existing) => Self::replay(existing, cmd.user_id),
                    None => Err(SagaError::Store(BookingStoreError::DuplicateRequestId(
                        request_id,
                    ))),
                }
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    %room_id,
                    %request_id,
                    "failed to persist booking, compensating"
                );
                if let Err(failure) = self.compensate(room_id, &request_id).await {
                    tracing::error!(
                        error = %failure,
                        "compensation failed, room load left incremented"
                    );
                }
                Err(e.into())
            }
        }
    }

    /// Cancels a booking and releases its room.
    ///
    /// The booking is marked `CANCELLED` first; the release that follows is
    /// best effort, and a failure is logged without undoing the cancellation.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_booking(
        &self,
        booking_id: BookingId,
        user_id: UserId,
    ) -> Result<Booking, SagaError> {
        let booking = self.load_owned(booking_id, user_id).await?;

        if booking.status == BookingStatus::Cancelled {
            return Err(SagaError::Validation(
                "Booking is already cancelled".to_string(),
            ));
        }
        if !booking.status.can_cancel() {
            return Err(SagaError::Validation(format!(
                "Booking cannot be cancelled in {} state",
                booking.status
            )));
        }

        // The version guard lets exactly one concurrent cancel through, so
        // the room is released at most once per booking.
        let cancelled = self
            .bookings
            .update_status(booking.id, BookingStatus::Cancelled, booking.version)
            .await?;

        if let Err(failure) = self.compensate(cancelled.room_id, &cancelled.request_id).await {
            tracing::warn!(error = %failure, "release failed, booking stays cancelled");
        }

        metrics::counter!("booking_cancellations_total").increment(1);
        tracing::info!(%booking_id, room_id = %cancelled.room_id, "booking cancelled");
        Ok(cancelled)
    }

    /// Loads a booking owned by `user_id`.
    #[tracing::instrument(skip(self))]
    pub async fn get_booking(
        &self,
        booking_id: BookingId,
        user_id: UserId,
    ) -> Result<Booking, SagaError> {
        self.load_owned(booking_id, user_id).await
    }

    /// Lists a user's bookings, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_bookings(
        &self,
        user_id: UserId,
        page: Page,
    ) -> Result<Vec<Booking>, SagaError> {
        Ok(self.bookings.list_for_user(user_id, page).await?)
    }

    fn validate_dates(&self, dates: &DateRange) -> Result<(), SagaError> {
        if !dates.is_ordered() {
            return Err(SagaError::Validation(
                "End date must be after start date".to_string(),
            ));
        }
        if dates.nights() > i64::from(self.config.max_booking_days) {
            return Err(SagaError::Validation(format!(
                "Booking duration exceeds maximum allowed days ({})",
                self.config.max_booking_days
            )));
        }
        Ok(())
    }

    async fn load_owned(
        &self,
        booking_id: BookingId,
        user_id: UserId,
    ) -> Result<Booking, SagaError> {
        let booking = self
            .bookings
            .get(booking_id)
            .await?
            .ok_or_else(|| SagaError::NotFound(format!("Booking not found with id: {booking_id}")))?;
        if !booking.is_owned_by(user_id) {
            return Err(SagaError::Forbidden("Access denied".to_string()));
        }
        Ok(booking)
    }

    fn replay(existing: Booking, user_id: UserId) -> Result<Booking, SagaError> {
        if !existing.is_owned_by(user_id) {
            return Err(SagaError::Forbidden("Access denied".to_string()));
        }
        tracing::info!(
            booking_id = %existing.id,
            request_id = %existing.request_id,
            "idempotency key already used, returning existing booking"
        );
        Ok(existing)
    }

    /// Releases the reservation made by `request_id`. Not retried.
    async fn compensate(&self, room_id: RoomId, request_id: &RequestId) -> Result<(), SagaError> {
        match self.rooms.release(room_id, request_id).await {
            Ok(()) => {
                metrics::counter!("booking_compensations_total", "outcome" => "released")
                    .increment(1);
                tracing::info!(%room_id, %request_id, "room released");
                Ok(())
            }
            Err(e) => {
                metrics::counter!("booking_compensations_total", "outcome" => "failed")
                    .increment(1);
                Err(SagaError::CompensationFailed {
                    room_id,
                    request_id: request_id.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }
}
