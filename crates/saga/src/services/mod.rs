//! The remote room-owner boundary and its implementations.

pub mod http;
pub mod in_process;
pub mod resilient;
pub mod room;

pub use http::HttpRoomService;
pub use in_process::InProcessRoomService;
pub use resilient::{
    CircuitBreaker, CircuitState, HOTEL_SERVICE_UNAVAILABLE, ResilienceConfig,
    ResilientRoomService,
};
pub use room::RoomService;
