//! Room service backed by a coordinator in the same process.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::{
    AvailabilityConfirmation, ConfirmAvailability, HotelId, RequestId, RoomId, RoomSummary,
    RoomType,
};
use inventory::{AvailabilityCoordinator, RoomSelector, RoomStore};

use crate::error::SagaError;
use crate::services::room::RoomService;

#[derive(Debug, Default)]
struct Faults {
    fail_on_get: bool,
    fail_on_confirm: bool,
    fail_on_release: bool,
    confirm_calls: usize,
    release_calls: usize,
}

/// Calls the availability coordinator and room selector directly.
///
/// Used when the booking service runs without a separate hotel service, and
/// in tests. Calls can be made to fail as if the hotel service were down.
pub struct InProcessRoomService<S>
where
    S: RoomStore,
{
    coordinator: Arc<AvailabilityCoordinator<S>>,
    selector: RoomSelector<S>,
    faults: Arc<RwLock<Faults>>,
}

impl<S> Clone for InProcessRoomService<S>
where
    S: RoomStore,
{
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
            selector: self.selector.clone(),
            faults: Arc::clone(&self.faults),
        }
    }
}

impl<S> InProcessRoomService<S>
where
    S: RoomStore,
{
    /// Creates a service over a shared coordinator.
    pub fn new(coordinator: Arc<AvailabilityCoordinator<S>>) -> Self {
        let selector = RoomSelector::new(Arc::clone(&coordinator));
        Self {
            coordinator,
            selector,
            faults: Arc::default(),
        }
    }

    /// Returns the wrapped coordinator.
    pub fn coordinator(&self) -> &Arc<AvailabilityCoordinator<S>> {
        &self.coordinator
    }

    /// Makes room lookups fail with `ServiceUnavailable`.
    pub fn set_fail_on_get(&self, fail: bool) {
        self.faults_mut().fail_on_get = fail;
    }

    /// Makes confirm calls fail with `ServiceUnavailable` before reaching the
    /// coordinator.
    pub fn set_fail_on_confirm(&self, fail: bool) {
        self.faults_mut().fail_on_confirm = fail;
    }

    /// Makes release calls fail with `ServiceUnavailable`.
    pub fn set_fail_on_release(&self, fail: bool) {
        self.faults_mut().fail_on_release = fail;
    }

    /// Number of confirm calls received, including failed ones.
    pub fn confirm_calls(&self) -> usize {
        self.faults().confirm_calls
    }

    /// Number of release calls received, including failed ones.
    pub fn release_calls(&self) -> usize {
        self.faults().release_calls
    }

    fn faults(&self) -> std::sync::RwLockReadGuard<'_, Faults> {
        self.faults.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn faults_mut(&self) -> std::sync::RwLockWriteGuard<'_, Faults> {
        self.faults.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn unavailable(operation: &str) -> SagaError {
    SagaError::ServiceUnavailable(format!("hotel service unavailable during {operation}"))
}

#[async_trait]
impl<S> RoomService for InProcessRoomService<S>
where
    S: RoomStore,
{
    async fn get_room(&self, room_id: RoomId) -> Result<RoomSummary, SagaError> {
        if self.faults().fail_on_get {
            return Err(unavailable("room lookup"));
        }
        Ok(self.coordinator.get_room(room_id).await?.summary())
    }

    async fn recommend(&self) -> Result<Vec<RoomSummary>, SagaError> {
        let rooms = self.selector.recommend().await?;
        Ok(rooms.iter().map(|r| r.summary()).collect())
    }

    async fn select_room(
        &self,
        hotel_id: HotelId,
        room_type: RoomType,
    ) -> Result<RoomSummary, SagaError> {
        Ok(self
            .selector
            .select_optimal(hotel_id, room_type)
            .await?
            .summary())
    }

    async fn confirm(
        &self,
        room_id: RoomId,
        request: ConfirmAvailability,
    ) -> Result<AvailabilityConfirmation, SagaError> {
        {
            let mut faults = self.faults_mut();
            faults.confirm_calls += 1;
            if faults.fail_on_confirm {
                return Err(unavailable("confirm"));
            }
        }
        let dates = request.dates();
        Ok(self
            .coordinator
            .confirm(room_id, request.request_id, dates)
            .await?)
    }

    async fn release(&self, room_id: RoomId, request_id: &RequestId) -> Result<(), SagaError> {
        {
            let mut faults = self.faults_mut();
            faults.release_calls += 1;
            if faults.fail_on_release {
                return Err(unavailable("release"));
            }
        }
        self.coordinator.release(room_id, request_id.clone()).await?;
        Ok(())
    }
}
