//! API error types with HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use booking::BookingStoreError;
use common::{ParseRoomTypeError, correlation};
use inventory::InventoryError;
use saga::SagaError;
use serde::Serialize;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad input or a business rule violation.
    #[error("{0}")]
    BadRequest(String),
    /// The caller's identity is missing or malformed.
    #[error("{0}")]
    Unauthorized(String),
    /// The caller does not own the resource.
    #[error("{0}")]
    Forbidden(String),
    /// Resource not found.
    #[error("{0}")]
    NotFound(String),
    /// Optimistic concurrency conflict.
    #[error("{0}")]
    Conflict(String),
    /// A downstream service could not be reached.
    #[error("{0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: &'static str,
    pub message: String,
    /// Correlation ID of the failed request.
    pub trace_id: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        let body = ErrorResponse {
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error"),
            message: self.to_string(),
            trace_id: correlation::current().map(|id| id.as_str().to_string()),
        };
        (status, Json(body)).into_response()
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        match err {
            SagaError::Validation(msg) => ApiError::BadRequest(msg),
            SagaError::NotFound(msg) => ApiError::NotFound(msg),
            SagaError::Forbidden(msg) => ApiError::Forbidden(msg),
            SagaError::ConcurrencyConflict(msg) => ApiError::Conflict(msg),
            SagaError::ServiceUnavailable(msg) => ApiError::ServiceUnavailable(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::RoomNotFound(_) => ApiError::NotFound(err.to_string()),
            InventoryError::NoAvailableRooms(_)
            | InventoryError::InvalidRoom(_)
            | InventoryError::RequestIdReused { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            InventoryError::ConcurrencyConflict { .. } => ApiError::Conflict(err.to_string()),
            InventoryError::Database(_) | InventoryError::Migration(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<BookingStoreError> for ApiError {
    fn from(err: BookingStoreError) -> Self {
        SagaError::from(err).into()
    }
}

impl From<ParseRoomTypeError> for ApiError {
    fn from(err: ParseRoomTypeError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

/// Errors that stop a service from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("room store initialisation failed: {0}")]
    Inventory(#[from] InventoryError),

    #[error("booking store initialisation failed: {0}")]
    Booking(#[from] BookingStoreError),

    #[error("hotel service client initialisation failed: {0}")]
    RoomService(#[from] SagaError),

    #[error("failed to install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{RequestId, RoomId, RoomType, Version};

    #[test]
    fn test_saga_errors_map_to_statuses() {
        let cases = [
            (SagaError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (SagaError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (SagaError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (
                SagaError::ConcurrencyConflict("stale".into()),
                StatusCode::CONFLICT,
            ),
            (
                SagaError::ServiceUnavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                SagaError::CompensationFailed {
                    room_id: RoomId::new(1),
                    request_id: RequestId::new("r"),
                    reason: "down".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_inventory_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from(InventoryError::RoomNotFound(RoomId::new(3))).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(InventoryError::NoAvailableRooms(RoomType::Suite)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(InventoryError::ConcurrencyConflict {
                room_id: RoomId::new(3),
                expected: Version::new(1),
                actual: Version::new(2),
            })
            .status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_store_unavailable_is_internal() {
        let err = ApiError::from(BookingStoreError::Unavailable("db down".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
