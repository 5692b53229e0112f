//! Room records.

use common::{HotelId, RequestId, RoomId, RoomSummary, RoomType, Version};
use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, Result};

/// Maximum length of a room number.
pub const MAX_ROOM_NUMBER_LENGTH: usize = 20;

/// A persisted room.
///
/// `times_booked` is the load counter used by the selector. It can only be
/// changed by the availability coordinator, which is why the mutators are
/// crate-private and there is no public setter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    id: RoomId,
    hotel_id: HotelId,
    room_number: String,
    room_type: RoomType,
    price_cents: i64,
    available: bool,
    times_booked: u32,
    version: Version,
    /// In-flight reservation marker. Not persisted across restarts.
    current_request_id: Option<RequestId>,
}

impl Room {
    pub(crate) fn from_parts(
        id: RoomId,
        new: NewRoom,
        times_booked: u32,
        version: Version,
    ) -> Self {
        Self {
            id,
            hotel_id: new.hotel_id,
            room_number: new.room_number,
            room_type: new.room_type,
            price_cents: new.price_cents,
            available: new.available,
            times_booked,
            version,
            current_request_id: None,
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn hotel_id(&self) -> HotelId {
        self.hotel_id
    }

    pub fn room_number(&self) -> &str {
        &self.room_number
    }

    pub fn room_type(&self) -> RoomType {
        self.room_type
    }

    pub fn price_cents(&self) -> i64 {
        self.price_cents
    }

    /// Returns false when the room is closed for reservations.
    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn times_booked(&self) -> u32 {
        self.times_booked
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the request ID of the reservation that last touched the room.
    pub fn current_request_id(&self) -> Option<&RequestId> {
        self.current_request_id.as_ref()
    }

    /// Returns the wire view of the room.
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id,
            hotel_id: self.hotel_id,
            room_number: self.room_number.clone(),
            room_type: self.room_type,
            price_cents: self.price_cents,
            available: self.available,
            times_booked: self.times_booked,
        }
    }

    pub(crate) fn reserve(&mut self, request_id: RequestId) {
        self.times_booked = self.times_booked.saturating_add(1);
        self.current_request_id = Some(request_id);
    }

    /// Decrements the load counter, clamping at zero.
    pub(crate) fn release(&mut self) {
        self.times_booked = self.times_booked.saturating_sub(1);
        self.current_request_id = None;
    }

    pub(crate) fn apply_details(&mut self, details: RoomDetails) {
        self.room_number = details.room_number;
        self.room_type = details.room_type;
        self.price_cents = details.price_cents;
        self.available = details.available;
    }

    pub(crate) fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    pub(crate) fn set_times_booked(&mut self, times_booked: u32) {
        self.times_booked = times_booked;
    }
}

/// Data for creating a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoom {
    pub hotel_id: HotelId,
    pub room_number: String,
    pub room_type: RoomType,
    pub price_cents: i64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl NewRoom {
    /// Creates an available room description.
    pub fn new(
        hotel_id: HotelId,
        room_number: impl Into<String>,
        room_type: RoomType,
        price_cents: i64,
    ) -> Self {
        Self {
            hotel_id,
            room_number: room_number.into(),
            room_type,
            price_cents,
            available: true,
        }
    }

    /// Sets the availability flag.
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_fields(&self.room_number, self.price_cents)
    }
}

/// Mutable room details. Deliberately excludes the load counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDetails {
    pub room_number: String,
    pub room_type: RoomType,
    pub price_cents: i64,
    pub available: bool,
}

impl RoomDetails {
    pub(crate) fn validate(&self) -> Result<()> {
        validate_fields(&self.room_number, self.price_cents)
    }
}

fn validate_fields(room_number: &str, price_cents: i64) -> Result<()> {
    if room_number.trim().is_empty() {
        return Err(InventoryError::InvalidRoom(
            "room number must not be empty".to_string(),
        ));
    }
    if room_number.len() > MAX_ROOM_NUMBER_LENGTH {
        return Err(InventoryError::InvalidRoom(format!(
            "room number exceeds {MAX_ROOM_NUMBER_LENGTH} characters"
        )));
    }
    if price_cents < 0 {
        return Err(InventoryError::InvalidRoom(
            "price must not be negative".to_string(),
        ));
    }
    Ok(())
}
