//! Load-balancing room selection.
//!
//! Rooms are ranked by how often they have been booked, least loaded first,
//! with the room ID as tie-break. Selection is a greedy pick of the head of
//! the ranking. An uneven spread of load across the candidates is reported
//! but never changes the pick.

use std::sync::Arc;

use common::{HotelId, RoomType};

use crate::{
    InventoryError, Result, coordinator::AvailabilityCoordinator, room::Room, store::RoomStore,
};

/// Maximum number of rooms returned by [`RoomSelector::recommend`].
pub const RECOMMENDATION_LIMIT: usize = 100;

/// Spread above this fraction of the mean load triggers a fairness warning.
pub const FAIRNESS_SPREAD_RATIO: f64 = 0.2;

/// Load distribution across a set of candidate rooms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSpread {
    pub min: u32,
    pub max: u32,
    pub mean: f64,
}

impl LoadSpread {
    /// Computes the spread of `times_booked` across rooms. `None` when empty.
    pub fn of(rooms: &[Room]) -> Option<Self> {
        let min = rooms.iter().map(Room::times_booked).min()?;
        let max = rooms.iter().map(Room::times_booked).max()?;
        let total: u64 = rooms.iter().map(|r| u64::from(r.times_booked())).sum();
        Some(Self {
            min,
            max,
            mean: total as f64 / rooms.len() as f64,
        })
    }

    /// Difference between the most and least loaded room.
    pub fn spread(&self) -> u32 {
        self.max - self.min
    }

    /// Returns true if the spread exceeds [`FAIRNESS_SPREAD_RATIO`] of the mean.
    pub fn is_unbalanced(&self) -> bool {
        f64::from(self.spread()) > self.mean * FAIRNESS_SPREAD_RATIO
    }
}

/// Orders rooms by load, then by ID.
pub fn rank_by_load(rooms: &mut [Room]) {
    rooms.sort_by_key(|r| (r.times_booked(), r.id()));
}

/// Picks rooms so booking pressure is spread across the inventory.
///
/// Reads rooms through the coordinator's read path.
pub struct RoomSelector<S>
where
    S: RoomStore,
{
    coordinator: Arc<AvailabilityCoordinator<S>>,
}

impl<S> Clone for RoomSelector<S>
where
    S: RoomStore,
{
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
        }
    }
}

impl<S> RoomSelector<S>
where
    S: RoomStore,
{
    pub fn new(coordinator: Arc<AvailabilityCoordinator<S>>) -> Self {
        Self { coordinator }
    }

    /// Returns available rooms, least loaded first, capped at
    /// [`RECOMMENDATION_LIMIT`].
    pub async fn recommend(&self) -> Result<Vec<Room>> {
        self.recommend_with_limit(RECOMMENDATION_LIMIT).await
    }

    /// Returns at most `limit` available rooms, least loaded first.
    #[tracing::instrument(skip(self))]
    pub async fn recommend_with_limit(&self, limit: usize) -> Result<Vec<Room>> {
        let mut rooms = self.coordinator.available_rooms().await?;
        rank_by_load(&mut rooms);
        rooms.truncate(limit);
        tracing::debug!(count = rooms.len(), "ranked recommended rooms");
        Ok(rooms)
    }

    /// Picks the least loaded available room of a hotel and type.
    ///
    /// Fails with `NoAvailableRooms` if the hotel has no open room of the type.
    #[tracing::instrument(skip(self))]
    pub async fn select_optimal(&self, hotel_id: HotelId, room_type: RoomType) -> Result<Room> {
        let mut candidates: Vec<Room> = self
            .coordinator
            .available_rooms()
            .await?
            .into_iter()
            .filter(|r| r.hotel_id() == hotel_id && r.room_type() == room_type)
            .collect();
        rank_by_load(&mut candidates);

        let spread =
            LoadSpread::of(&candidates).ok_or(InventoryError::NoAvailableRooms(room_type))?;
        if spread.is_unbalanced() {
            metrics::counter!("room_selection_fairness_warnings_total").increment(1);
            tracing::warn!(
                spread = spread.spread(),
                min = spread.min,
                max = spread.max,
                mean = spread.mean,
                "high load spread across candidate rooms"
            );
        }

        let selected = candidates.swap_remove(0);
        tracing::info!(
            room_id = %selected.id(),
            room_number = selected.room_number(),
            times_booked = selected.times_booked(),
            mean = spread.mean,
            "selected room"
        );
        Ok(selected)
    }
}
