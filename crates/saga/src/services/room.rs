//! The booking service's view of the hotel service.

use std::sync::Arc;

use async_trait::async_trait;
use common::{
    AvailabilityConfirmation, ConfirmAvailability, HotelId, RequestId, RoomId, RoomSummary,
    RoomType,
};

use crate::error::SagaError;

/// Operations the booking saga needs from the room owner.
///
/// `confirm` and `release` are idempotent per request ID and the rest are
/// reads, so every call is safe to retry.
#[async_trait]
pub trait RoomService: Send + Sync {
    /// Loads a room.
    async fn get_room(&self, room_id: RoomId) -> Result<RoomSummary, SagaError>;

    /// Lists available rooms, least loaded first.
    async fn recommend(&self) -> Result<Vec<RoomSummary>, SagaError>;

    /// Picks the least loaded available room of a hotel and type.
    async fn select_room(
        &self,
        hotel_id: HotelId,
        room_type: RoomType,
    ) -> Result<RoomSummary, SagaError>;

    /// Reserves a room for one reservation attempt.
    async fn confirm(
        &self,
        room_id: RoomId,
        request: ConfirmAvailability,
    ) -> Result<AvailabilityConfirmation, SagaError>;

    /// Releases the slot reserved by `request_id`.
    async fn release(&self, room_id: RoomId, request_id: &RequestId) -> Result<(), SagaError>;
}

#[async_trait]
impl<T> RoomService for Arc<T>
where
    T: RoomService + ?Sized,
{
    async fn get_room(&self, room_id: RoomId) -> Result<RoomSummary, SagaError> {
        (**self).get_room(room_id).await
    }

    async fn recommend(&self) -> Result<Vec<RoomSummary>, SagaError> {
        (**self).recommend().await
    }

    async fn select_room(
        &self,
        hotel_id: HotelId,
        room_type: RoomType,
    ) -> Result<RoomSummary, SagaError> {
        (**self).select_room(hotel_id, room_type).await
    }

    async fn confirm(
        &self,
        room_id: RoomId,
        request: ConfirmAvailability,
    ) -> Result<AvailabilityConfirmation, SagaError> {
        (**self).confirm(room_id, request).await
    }

    async fn release(&self, room_id: RoomId, request_id: &RequestId) -> Result<(), SagaError> {
        (**self).release(room_id, request_id).await
    }
}
