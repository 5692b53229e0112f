//! Booking saga spanning the booking service and the hotel service.
//!
//! Creating a booking is a two-step transaction across services that fail
//! independently:
//! 1. Reserve the room with the hotel service (`confirm`)
//! 2. Commit the booking locally as `CONFIRMED`
//!
//! If step 2 fails after step 1 succeeded, the reservation is compensated by
//! a single `release` call. The hotel service is reached through the
//! [`RoomService`] trait, implemented in-process, over HTTP and as a
//! resilience decorator adding timeouts, retries and a circuit breaker.

pub mod error;
pub mod orchestrator;
pub mod services;

pub use error::{Result, SagaError};
pub use orchestrator::{
    BookingSaga, CreateBooking, KEY_USED_FOR_OTHER_ROOM, ROOM_UNAVAILABLE, RoomChoice, SagaConfig,
};
pub use services::{
    CircuitBreaker, CircuitState, HOTEL_SERVICE_UNAVAILABLE, HttpRoomService,
    InProcessRoomService, ResilienceConfig, ResilientRoomService, RoomService,
};
