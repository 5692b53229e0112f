//! Saga error types.

use booking::BookingStoreError;
use common::{RequestId, RoomId};
use inventory::InventoryError;
use thiserror::Error;

/// Errors that can occur while running a booking saga.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Bad input or a business rule violation. Never retried.
    #[error("{0}")]
    Validation(String),

    /// The referenced booking or room does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The caller does not own the booking.
    #[error("{0}")]
    Forbidden(String),

    /// An optimistic version check failed. Retrying the whole operation is safe.
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// The hotel service could not be reached after retries, or its circuit
    /// is open. Nothing was reserved.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Releasing a reserved room during rollback failed.
    #[error("Failed to release room {room_id} for request {request_id}: {reason}")]
    CompensationFailed {
        room_id: RoomId,
        request_id: RequestId,
        reason: String,
    },

    /// Local booking persistence failed.
    #[error("Booking store error: {0}")]
    Store(BookingStoreError),
}

impl SagaError {
    /// Returns true if the operation may succeed when retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SagaError::ConcurrencyConflict(_) | SagaError::ServiceUnavailable(_)
        )
    }

    /// Short label used in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SagaError::Validation(_) => "validation",
            SagaError::NotFound(_) => "not_found",
            SagaError::Forbidden(_) => "forbidden",
            SagaError::ConcurrencyConflict(_) => "concurrency_conflict",
            SagaError::ServiceUnavailable(_) => "service_unavailable",
            SagaError::CompensationFailed { .. } => "compensation_failed",
            SagaError::Store(_) => "store",
        }
    }
}

impl From<BookingStoreError> for SagaError {
    fn from(e: BookingStoreError) -> Self {
        match e {
            BookingStoreError::NotFound(_) => SagaError::NotFound(e.to_string()),
            BookingStoreError::ConcurrencyConflict { .. } => {
                SagaError::ConcurrencyConflict(e.to_string())
            }
            other => SagaError::Store(other),
        }
    }
}

impl From<InventoryError> for SagaError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::RoomNotFound(_) => SagaError::NotFound(e.to_string()),
            InventoryError::NoAvailableRooms(_)
            | InventoryError::InvalidRoom(_)
            | InventoryError::RequestIdReused { .. } => {
                SagaError::Validation(e.to_string())
            }
            InventoryError::ConcurrencyConflict { .. } => {
                SagaError::ConcurrencyConflict(e.to_string())
            }
            InventoryError::Database(_) | InventoryError::Migration(_) => {
                SagaError::ServiceUnavailable(e.to_string())
            }
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
