//! Room inventory for the hotel service.
//!
//! This crate owns room records and the two pieces of logic that guard them:
//!
//! - [`AvailabilityCoordinator`] serializes reservations per room, keeps an
//!   idempotency record of outcomes and is the only writer of a room's load
//!   counter.
//! - [`RoomSelector`] ranks rooms by load so bookings spread evenly across
//!   the inventory.
//!
//! Rooms are persisted through the [`RoomStore`] trait, with in-memory and
//! PostgreSQL implementations.

pub mod coordinator;
pub mod error;
pub mod lock;
pub mod memory;
pub mod outcome_cache;
pub mod postgres;
pub mod room;
pub mod selector;
pub mod store;

pub use coordinator::{AvailabilityCoordinator, ROOM_NOT_AVAILABLE};
pub use error::{InventoryError, Result};
pub use lock::RoomLocks;
pub use memory::InMemoryRoomStore;
pub use outcome_cache::{OutcomeCache, OutcomeCacheConfig};
pub use postgres::PostgresRoomStore;
pub use room::{NewRoom, Room, RoomDetails};
pub use selector::{LoadSpread, RECOMMENDATION_LIMIT, RoomSelector};
pub use store::RoomStore;
