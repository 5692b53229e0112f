use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{HotelId, RoomId, Version};
use tokio::sync::RwLock;

use crate::{
    InventoryError, Result,
    room::{NewRoom, Room, RoomDetails},
    store::RoomStore,
};

#[derive(Default)]
struct State {
    rooms: BTreeMap<RoomId, Room>,
    next_id: i64,
}

/// In-memory room store for tests and single-process deployments.
///
/// Clones share the same underlying state.
#[derive(Clone, Default)]
pub struct InMemoryRoomStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryRoomStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a room with a preset load counter.
    ///
    /// Test fixture only: production code never sets `times_booked` directly.
    pub async fn seed(&self, room: NewRoom, times_booked: u32) -> Result<Room> {
        let mut inserted = self.insert(room).await?;
        let mut state = self.state.write().await;
        if let Some(stored) = state.rooms.get_mut(&inserted.id()) {
            stored.set_times_booked(times_booked);
            inserted = stored.clone();
        }
        Ok(inserted)
    }

    /// Returns the number of stored rooms.
    pub async fn room_count(&self) -> usize {
        self.state.read().await.rooms.len()
    }

    /// Removes all rooms.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.rooms.clear();
        state.next_id = 0;
    }
}

fn check_version(room: &Room, expected: Version) -> Result<()> {
    if room.version() != expected {
        return Err(InventoryError::ConcurrencyConflict {
            room_id: room.id(),
            expected,
            actual: room.version(),
        });
    }
    Ok(())
}

fn check_unique_number(
    state: &State,
    exclude: Option<RoomId>,
    hotel_id: HotelId,
    room_number: &str,
) -> Result<()> {
    let taken = state.rooms.values().any(|r| {
        Some(r.id()) != exclude && r.hotel_id() == hotel_id && r.room_number() == room_number
    });
    if taken {
        return Err(InventoryError::InvalidRoom(format!(
            "room number {room_number} already exists in hotel {hotel_id}"
        )));
    }
    Ok(())
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn insert(&self, room: NewRoom) -> Result<Room> {
        room.validate()?;
        let mut state = self.state.write().await;
        check_unique_number(&state, None, room.hotel_id, &room.room_number)?;

        state.next_id += 1;
        let id = RoomId::new(state.next_id);
        let stored = Room::from_parts(id, room, 0, Version::initial());
        state.rooms.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: RoomId) -> Result<Option<Room>> {
        Ok(self.state.read().await.rooms.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Room>> {
        Ok(self.state.read().await.rooms.values().cloned().collect())
    }

    async fn list_available(&self) -> Result<Vec<Room>> {
        Ok(self
            .state
            .read()
            .await
            .rooms
            .values()
            .filter(|r| r.is_available())
            .cloned()
            .collect())
    }

    async fn update_details(
        &self,
        id: RoomId,
        details: RoomDetails,
        expected_version: Version,
    ) -> Result<Room> {
        details.validate()?;
        let mut state = self.state.write().await;
        let hotel_id = state
            .rooms
            .get(&id)
            .map(Room::hotel_id)
            .ok_or(InventoryError::RoomNotFound(id))?;
        check_unique_number(&state, Some(id), hotel_id, &details.room_number)?;

        let room = state
            .rooms
            .get_mut(&id)
            .ok_or(InventoryError::RoomNotFound(id))?;
        check_version(room, expected_version)?;
        room.apply_details(details);
        room.set_version(expected_version.next());
        Ok(room.clone())
    }

    async fn save_load(&self, room: &Room, expected_version: Version) -> Result<Room> {
        let mut state = self.state.write().await;
        let stored = state
            .rooms
            .get_mut(&room.id())
            .ok_or(InventoryError::RoomNotFound(room.id()))?;
        check_version(stored, expected_version)?;

        let details = RoomDetails {
            room_number: stored.room_number().to_string(),
            room_type: stored.room_type(),
            price_cents: stored.price_cents(),
            available: stored.is_available(),
        };
        let mut updated = room.clone();
        updated.apply_details(details);
        updated.set_version(expected_version.next());
        *stored = updated.clone();
        Ok(updated)
    }
}
