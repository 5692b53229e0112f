//! Shared types for the hotel booking services.
//!
//! Identifiers, room types and date ranges used by both the booking owner and
//! the room owner, plus the request/response types of the remote boundary
//! between them.

pub mod correlation;
pub mod dates;
pub mod types;
pub mod wire;

pub use dates::DateRange;
pub use types::{
    BookingId, CorrelationId, HotelId, ParseRoomTypeError, RequestId, RoomId, RoomType, UserId,
    Version,
};
pub use wire::{AvailabilityConfirmation, ConfirmAvailability, RoomSummary};
