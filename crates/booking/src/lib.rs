//! Bookings owned by the booking service.
//!
//! Provides the [`Booking`] record, its [`BookingStatus`] lifecycle and the
//! [`BookingStore`] persistence trait with in-memory and PostgreSQL
//! implementations.

pub mod booking;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod status;
pub mod store;

pub use booking::{Booking, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, NewBooking, Page};
pub use error::{BookingStoreError, Result};
pub use memory::InMemoryBookingStore;
pub use postgres::PostgresBookingStore;
pub use status::BookingStatus;
pub use store::BookingStore;
