//! Booking store error types.

use common::{BookingId, RequestId, Version};
use thiserror::Error;

/// Errors that can occur when persisting bookings.
#[derive(Debug, Error)]
pub enum BookingStoreError {
    /// The booking does not exist.
    #[error("Booking not found with id: {0}")]
    NotFound(BookingId),

    /// Another booking already carries this request ID.
    #[error("A booking already exists for request {0}")]
    DuplicateRequestId(RequestId),

    /// The booking was modified since it was read.
    #[error(
        "Concurrency conflict for booking {booking_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        booking_id: BookingId,
        expected: Version,
        actual: Version,
    },

    /// The store could not complete the operation.
    #[error("Booking store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for booking store operations.
pub type Result<T> = std::result::Result<T, BookingStoreError>;
