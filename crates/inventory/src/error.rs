//! Inventory error types.

use common::{RequestId, RoomId, RoomType, Version};
use thiserror::Error;

/// Errors that can occur in the room store, the availability coordinator and
/// the room selector.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The room does not exist.
    #[error("Room not found with id: {0}")]
    RoomNotFound(RoomId),

    /// No available room matches the selection criteria.
    #[error("No available rooms of type {0}")]
    NoAvailableRooms(RoomType),

    /// The room was modified by another writer since it was read.
    #[error(
        "Concurrency conflict for room {room_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        room_id: RoomId,
        expected: Version,
        actual: Version,
    },

    /// The request ID already carries an outcome for a different room.
    #[error("Request {request_id} was already used to reserve room {room_id}")]
    RequestIdReused {
        request_id: RequestId,
        room_id: RoomId,
    },

    /// The room data violates a store constraint.
    #[error("Invalid room: {0}")]
    InvalidRoom(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl InventoryError {
    /// Returns true if retrying the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, InventoryError::ConcurrencyConflict { .. })
    }
}

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;
