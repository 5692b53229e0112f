use async_trait::async_trait;
use common::{BookingId, RequestId, UserId, Version};

use crate::{
    Result,
    booking::{Booking, NewBooking, Page},
    status::BookingStatus,
};

/// Persistence for bookings.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Inserts a booking with a store-assigned ID and the initial version.
    ///
    /// Fails with `DuplicateRequestId` if a booking with the same request ID
    /// already exists.
    async fn insert(&self, booking: NewBooking) -> Result<Booking>;

    /// Loads a booking by ID.
    async fn get(&self, id: BookingId) -> Result<Option<Booking>>;

    /// Loads the booking created by a reservation attempt.
    async fn find_by_request_id(&self, request_id: &RequestId) -> Result<Option<Booking>>;

    /// Changes the status of a booking and bumps its version.
    ///
    /// Fails with `ConcurrencyConflict` if the booking is no longer at
    /// `expected_version`.
    async fn update_status(
        &self,
        id: BookingId,
        status: BookingStatus,
        expected_version: Version,
    ) -> Result<Booking>;

    /// Lists a user's bookings, newest first.
    async fn list_for_user(&self, user_id: UserId, page: Page) -> Result<Vec<Booking>>;
}

#[async_trait]
impl<T> BookingStore for std::sync::Arc<T>
where
    T: BookingStore + ?Sized,
{
    async fn insert(&self, booking: NewBooking) -> Result<Booking> {
        (**self).insert(booking).await
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        (**self).get(id).await
    }

    async fn find_by_request_id(&self, request_id: &RequestId) -> Result<Option<Booking>> {
        (**self).find_by_request_id(request_id).await
    }

    async fn update_status(
        &self,
        id: BookingId,
        status: BookingStatus,
        expected_version: Version,
    ) -> Result<Booking> {
        (**self).update_status(id, status, expected_version).await
    }

    async fn list_for_user(&self, user_id: UserId, page: Page) -> Result<Vec<Booking>> {
        (**self).list_for_user(user_id, page).await
    }
}
