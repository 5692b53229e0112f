use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw store-assigned identifier.
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw identifier.
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a room, assigned by the room store.
    RoomId
);
numeric_id!(
    /// Identifier of a hotel.
    HotelId
);
numeric_id!(
    /// Identifier of a booking, assigned by the booking store.
    BookingId
);
numeric_id!(
    /// Identifier of the user who owns a booking.
    UserId
);

/// Optimistic-concurrency version of a stored record.
///
/// Starts at 0 when the record is created and is bumped by every mutation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version of a freshly created record.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Idempotency key of a single reservation attempt.
///
/// The same key is threaded through `confirm` and `release` so the room owner
/// can de-duplicate retries of one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Creates a request ID from a caller-supplied key.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh random request ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the request ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Cross-service tracing identifier carried in the `X-Correlation-ID` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Creates a correlation ID from an inbound header value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a new random correlation ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the correlation ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomType {
    Single,
    Double,
    Twin,
    Suite,
    Deluxe,
    Family,
    Presidential,
}

impl RoomType {
    /// Number of guests the room type accommodates.
    pub fn capacity(&self) -> u32 {
        match self {
            RoomType::Single => 1,
            RoomType::Double | RoomType::Twin | RoomType::Suite | RoomType::Deluxe => 2,
            RoomType::Family | RoomType::Presidential => 4,
        }
    }

    /// Returns the wire name of the room type.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Single => "SINGLE",
            RoomType::Double => "DOUBLE",
            RoomType::Twin => "TWIN",
            RoomType::Suite => "SUITE",
            RoomType::Deluxe => "DELUXE",
            RoomType::Family => "FAMILY",
            RoomType::Presidential => "PRESIDENTIAL",
        }
    }
}

impl std::fmt::Display for RoomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown room type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown room type: {0}")]
pub struct ParseRoomTypeError(String);

impl std::str::FromStr for RoomType {
    type Err = ParseRoomTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SINGLE" => Ok(RoomType::Single),
            "DOUBLE" => Ok(RoomType::Double),
            "TWIN" => Ok(RoomType::Twin),
            "SUITE" => Ok(RoomType::Suite),
            "DELUXE" => Ok(RoomType::Deluxe),
            "FAMILY" => Ok(RoomType::Family),
            "PRESIDENTIAL" => Ok(RoomType::Presidential),
            _ => Err(ParseRoomTypeError(s.to_string())),
        }
    }
}
