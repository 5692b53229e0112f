//! Types exchanged between the booking service and the hotel service.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::DateRange;
use crate::types::{HotelId, RequestId, RoomId, RoomType};

/// Header carrying the cross-service correlation ID.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Header carrying the authenticated caller, set by the gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying a client-supplied idempotency key for booking creation.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Body of `POST /api/v1/rooms/{id}/confirm-availability`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmAvailability {
    pub request_id: RequestId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ConfirmAvailability {
    /// Builds a confirm request for one reservation attempt.
    pub fn new(request_id: RequestId, dates: DateRange) -> Self {
        Self {
            request_id,
            start_date: dates.start_date,
            end_date: dates.end_date,
        }
    }

    /// Returns the requested stay.
    pub fn dates(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

/// Outcome of a confirm call. Cached by the room owner under `request_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityConfirmation {
    pub request_id: RequestId,
    pub room_id: RoomId,
    pub confirmed: bool,
    pub message: String,
}

impl AvailabilityConfirmation {
    /// A confirmed reservation.
    pub fn confirmed(request_id: RequestId, room_id: RoomId) -> Self {
        Self {
            request_id,
            room_id,
            confirmed: true,
            message: "Room availability confirmed".to_string(),
        }
    }

    /// A denied reservation; the room was not mutated.
    pub fn denied(request_id: RequestId, room_id: RoomId, message: impl Into<String>) -> Self {
        Self {
            request_id,
            room_id,
            confirmed: false,
            message: message.into(),
        }
    }
}

/// Room view returned by the hotel service's read endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: RoomId,
    pub hotel_id: HotelId,
    pub room_number: String,
    pub room_type: RoomType,
    pub price_cents: i64,
    pub available: bool,
    pub times_booked: u32,
}
