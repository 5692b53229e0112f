//! Room availability coordinator.

use std::time::Instant;

use common::{AvailabilityConfirmation, DateRange, RequestId, RoomId};

use crate::{
    InventoryError, Result,
    lock::RoomLocks,
    outcome_cache::{OutcomeCache, OutcomeCacheConfig},
    room::{NewRoom, Room, RoomDetails},
    store::RoomStore,
};

/// Message returned when a reservation is refused because the room is closed.
pub const ROOM_NOT_AVAILABLE: &str = "Room is not available";

/// Guards reservations of rooms.
///
/// `confirm` and `release` are the only operations that change a room's load
/// counter. Both run inside the room's critical section, so concurrent calls
/// on one room are serialized while calls on different rooms run in parallel.
/// The store's version guard backs the lock up for writers that do not go
/// through the coordinator.
///
/// Outcomes of `confirm` are remembered per request ID so a retried call
/// returns the first result instead of reserving the room twice.
pub struct AvailabilityCoordinator<S>
where
    S: RoomStore,
{
    store: S,
    locks: RoomLocks,
    outcomes: OutcomeCache,
}

impl<S> AvailabilityCoordinator<S>
where
    S: RoomStore,
{
    /// Creates a coordinator with a default-sized outcome cache.
    pub fn new(store: S) -> Self {
        Self::with_cache_config(store, OutcomeCacheConfig::default())
    }

    /// Creates a coordinator with a custom outcome cache.
    pub fn with_cache_config(store: S, config: OutcomeCacheConfig) -> Self {
        Self {
            store,
            locks: RoomLocks::new(),
            outcomes: OutcomeCache::new(config),
        }
    }

    /// Gets a reference to the underlying room store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reserves a room for one reservation attempt.
    ///
    /// Returns `confirmed = false` without touching the room when it is
    /// closed. Replays of a known `request_id` return the cached outcome; a
    /// request ID already used for another room is rejected with
    /// `RequestIdReused`.
    #[tracing::instrument(skip(self, dates), fields(dates = %dates))]
    pub async fn confirm(
        &self,
        room_id: RoomId,
        request_id: RequestId,
        dates: DateRange,
    ) -> Result<AvailabilityConfirmation> {
        let started = Instant::now();
        let result = self.reserve(room_id, request_id).await;
        metrics::histogram!("room_confirm_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        result
    }

    async fn reserve(
        &self,
        room_id: RoomId,
        request_id: RequestId,
    ) -> Result<AvailabilityConfirmation> {
        if let Some(outcome) = self.replay(room_id, &request_id)? {
            return Ok(outcome);
        }

        let _guard = self.locks.acquire(room_id).await;

        // A concurrent call with the same request ID may have won the lock.
        if let Some(outcome) = self.replay(room_id, &request_id)? {
            return Ok(outcome);
        }

        let room = self
            .store
            .get(room_id)
            .await?
            .ok_or(InventoryError::RoomNotFound(room_id))?;

        if !room.is_available() {
            let outcome =
                AvailabilityConfirmation::denied(request_id.clone(), room_id, ROOM_NOT_AVAILABLE);
            self.outcomes.insert(request_id, outcome.clone());
            metrics::counter!("room_confirm_total", "outcome" => "denied").increment(1);
            tracing::info!("room not available, reservation denied");
            return Ok(outcome);
        }

        let expected = room.version();
        let mut reserved = room;
        reserved.reserve(request_id.clone());
        let saved = self
            .store
            .save_load(&reserved, expected)
            .await
            .inspect_err(|e| {
                if let InventoryError::ConcurrencyConflict { .. } = e {
                    tracing::error!("version conflict while reserving room");
                }
            })?;

        let outcome = AvailabilityConfirmation::confirmed(request_id.clone(), room_id);
        self.outcomes.insert(request_id, outcome.clone());

        metrics::counter!("room_confirm_total", "outcome" => "confirmed").increment(1);
        tracing::info!(times_booked = saved.times_booked(), "room confirmed");

        Ok(outcome)
    }

    /// Releases a slot previously reserved by `confirm`.
    ///
    /// The load counter never drops below zero, so releasing an already
    /// released slot is harmless. The request's cached outcome is evicted.
    #[tracing::instrument(skip(self))]
    pub async fn release(&self, room_id: RoomId, request_id: RequestId) -> Result<Room> {
        let _guard = self.locks.acquire(room_id).await;

        let room = self
            .store
            .get(room_id)
            .await?
            .ok_or(InventoryError::RoomNotFound(room_id))?;

        let expected = room.version();
        let mut released = room;
        released.release();
        let saved = self.store.save_load(&released, expected).await?;

        self.outcomes.remove(&request_id);

        metrics::counter!("room_release_total").increment(1);
        tracing::info!(times_booked = saved.times_booked(), "room slot released");

        Ok(saved)
    }

    /// Loads a room.
    pub async fn get_room(&self, room_id: RoomId) -> Result<Room> {
        self.store
            .get(room_id)
            .await?
            .ok_or(InventoryError::RoomNotFound(room_id))
    }

    /// Lists rooms open for reservation.
    pub async fn available_rooms(&self) -> Result<Vec<Room>> {
        self.store.list_available().await
    }

    /// Adds a room to the inventory.
    #[tracing::instrument(skip(self))]
    pub async fn create_room(&self, room: NewRoom) -> Result<Room> {
        let room = self.store.insert(room).await?;
        tracing::info!(room_id = %room.id(), "room created");
        Ok(room)
    }

    /// Updates a room's details, including its availability flag.
    ///
    /// Takes the room's lock so a closing room cannot race a reservation.
    #[tracing::instrument(skip(self))]
    pub async fn update_room(&self, room_id: RoomId, details: RoomDetails) -> Result<Room> {
        let _guard = self.locks.acquire(room_id).await;
        let room = self.get_room(room_id).await?;
        self.store
            .update_details(room_id, details, room.version())
            .await
    }

    fn replay(
        &self,
        room_id: RoomId,
        request_id: &RequestId,
    ) -> Result<Option<AvailabilityConfirmation>> {
        let Some(outcome) = self.outcomes.get(request_id) else {
            return Ok(None);
        };
        if outcome.room_id != room_id {
            metrics::counter!("room_confirm_total", "outcome" => "rejected").increment(1);
            tracing::warn!(
                cached_room_id = %outcome.room_id,
                "request ID already used for another room"
            );
            return Err(InventoryError::RequestIdReused {
                request_id: request_id.clone(),
                room_id: outcome.room_id,
            });
        }
        metrics::counter!("room_confirm_total", "outcome" => "replayed").increment(1);
        tracing::info!(confirmed = outcome.confirmed, "request already processed");
        Ok(Some(outcome))
    }
}
