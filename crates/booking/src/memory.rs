use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::{BookingId, RequestId, UserId, Version};
use tokio::sync::RwLock;

use crate::{
    BookingStoreError, Result,
    booking::{Booking, NewBooking, Page},
    status::BookingStatus,
    store::BookingStore,
};

#[derive(Default)]
struct State {
    bookings: BTreeMap<BookingId, Booking>,
    next_id: i64,
}

#[derive(Default)]
struct Faults {
    fail_on_insert: AtomicBool,
    fail_on_update: AtomicBool,
}

/// In-memory booking store for testing and single-process deployments.
///
/// Clones share the same underlying state. Writes can be made to fail on
/// demand to exercise the saga's compensation path.
#[derive(Clone, Default)]
pub struct InMemoryBookingStore {
    state: Arc<RwLock<State>>,
    faults: Arc<Faults>,
}

impl InMemoryBookingStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent insert fail with `Unavailable`.
    pub fn set_fail_on_insert(&self, fail: bool) {
        self.faults.fail_on_insert.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent status update fail with `Unavailable`.
    pub fn set_fail_on_update(&self, fail: bool) {
        self.faults.fail_on_update.store(fail, Ordering::SeqCst);
    }

    /// Returns the total number of stored bookings.
    pub async fn booking_count(&self) -> usize {
        self.state.read().await.bookings.len()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, booking: NewBooking) -> Result<Booking> {
        if self.faults.fail_on_insert.load(Ordering::SeqCst) {
            return Err(BookingStoreError::Unavailable(
                "simulated insert failure".to_string(),
            ));
        }

        let mut state = self.state.write().await;
        if state
            .bookings
            .values()
            .any(|b| b.request_id == booking.request_id)
        {
            return Err(BookingStoreError::DuplicateRequestId(booking.request_id));
        }

        state.next_id += 1;
        let id = BookingId::new(state.next_id);
        let stored = Booking {
            id,
            user_id: booking.user_id,
            room_id: booking.room_id,
            start_date: booking.dates.start_date,
            end_date: booking.dates.end_date,
            status: booking.status,
            request_id: booking.request_id,
            version: Version::initial(),
            created_at: Utc::now(),
        };
        state.bookings.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.state.read().await.bookings.get(&id).cloned())
    }

    async fn find_by_request_id(&self, request_id: &RequestId) -> Result<Option<Booking>> {
        Ok(self
            .state
            .read()
            .await
            .bookings
            .values()
            .find(|b| &b.request_id == request_id)
            .cloned())
    }

    async fn update_status(
        &self,
        id: BookingId,
        status: BookingStatus,
        expected_version: Version,
    ) -> Result<Booking> {
        if self.faults.fail_on_update.load(Ordering::SeqCst) {
            return Err(BookingStoreError::Unavailable(
                "simulated update failure".to_string(),
            ));
        }

        let mut state = self.state.write().await;
        let booking = state
            .bookings
            .get_mut(&id)
            .ok_or(BookingStoreError::NotFound(id))?;
        if booking.version != expected_version {
            return Err(BookingStoreError::ConcurrencyConflict {
                booking_id: id,
                expected: expected_version,
                actual: booking.version,
            });
        }

        booking.status = status;
        booking.version = expected_version.next();
        Ok(booking.clone())
    }

    async fn list_for_user(&self, user_id: UserId, page: Page) -> Result<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(bookings
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }
}
