use async_trait::async_trait;
use common::{RoomId, Version};

use crate::{
    Result,
    room::{NewRoom, Room, RoomDetails},
};

/// Persistence for room records.
///
/// Every mutation is guarded by the room's optimistic version: the caller
/// passes the version it last read and the write fails with
/// `ConcurrencyConflict` if another writer got there first.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Inserts a new room with `times_booked = 0` and the initial version.
    ///
    /// Fails with `InvalidRoom` if the hotel already has a room with the same
    /// number.
    async fn insert(&self, room: NewRoom) -> Result<Room>;

    /// Loads a room by ID.
    async fn get(&self, id: RoomId) -> Result<Option<Room>>;

    /// Lists all rooms ordered by ID.
    async fn list(&self) -> Result<Vec<Room>>;

    /// Lists rooms whose availability flag is set, ordered by ID.
    async fn list_available(&self) -> Result<Vec<Room>>;

    /// Updates the descriptive fields of a room. Never touches `times_booked`.
    async fn update_details(
        &self,
        id: RoomId,
        details: RoomDetails,
        expected_version: Version,
    ) -> Result<Room>;

    /// Persists the load counter of a room and bumps its version.
    ///
    /// Only the availability coordinator calls this, from inside the
    /// room's critical section.
    async fn save_load(&self, room: &Room, expected_version: Version) -> Result<Room>;
}

#[async_trait]
impl<T> RoomStore for std::sync::Arc<T>
where
    T: RoomStore + ?Sized,
{
    async fn insert(&self, room: NewRoom) -> Result<Room> {
        (**self).insert(room).await
    }

    async fn get(&self, id: RoomId) -> Result<Option<Room>> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<Room>> {
        (**self).list().await
    }

    async fn list_available(&self) -> Result<Vec<Room>> {
        (**self).list_available().await
    }

    async fn update_details(
        &self,
        id: RoomId,
        details: RoomDetails,
        expected_version: Version,
    ) -> Result<Room> {
        (**self).update_details(id, details, expected_version).await
    }

    async fn save_load(&self, room: &Room, expected_version: Version) -> Result<Room> {
        (**self).save_load(room, expected_version).await
    }
}
