//! Booking records.

use chrono::{DateTime, NaiveDate, Utc};
use common::{BookingId, DateRange, RequestId, RoomId, UserId, Version};
use serde::{Deserialize, Serialize};

use crate::status::BookingStatus;

/// Default page size for booking listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A persisted booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub room_id: RoomId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    /// Idempotency key of the reservation attempt. Unique across bookings.
    pub request_id: RequestId,
    pub version: Version,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Returns the booked stay.
    pub fn dates(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Returns true if the booking belongs to `user_id`.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

/// Data for creating a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub user_id: UserId,
    pub room_id: RoomId,
    pub dates: DateRange,
    pub status: BookingStatus,
    pub request_id: RequestId,
}

impl NewBooking {
    /// Describes a booking whose room has already been reserved.
    pub fn confirmed(
        user_id: UserId,
        room_id: RoomId,
        dates: DateRange,
        request_id: RequestId,
    ) -> Self {
        Self {
            user_id,
            room_id,
            dates,
            status: BookingStatus::Confirmed,
            request_id,
        }
    }
}

/// Offset pagination for booking listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    /// Creates a page, clamping the limit to `1..=MAX_PAGE_LIMIT`.
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
            offset,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT, 0)
    }
}
