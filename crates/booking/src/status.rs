//! Booking lifecycle.

use serde::{Deserialize, Serialize};

/// The status of a booking.
///
/// Transitions:
/// ```text
/// Pending ──┬──► Confirmed ──┬──► Completed
///           │                └──► Cancelled
///           ├──► Cancelled
///           └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Created, reservation not settled yet.
    Pending,

    /// Room reserved and booking committed.
    Confirmed,

    /// Cancelled by the user or rolled back (terminal state).
    Cancelled,

    /// Stay finished (terminal state).
    Completed,

    /// Reservation could not be completed (terminal state).
    Failed,
}

impl BookingStatus {
    /// Returns true if a user may cancel a booking in this status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Cancelled | BookingStatus::Completed | BookingStatus::Failed
        )
    }

    /// Returns true if a booking may move from this status to `next`.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (*self, next),
            (Pending, Confirmed | Cancelled | Failed) | (Confirmed, Cancelled | Completed)
        )
    }

    /// Returns the status name as stored and sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            "COMPLETED" => Ok(BookingStatus::Completed),
            "FAILED" => Ok(BookingStatus::Failed),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_cancel() {
        assert!(BookingStatus::Pending.can_cancel());
        assert!(BookingStatus::Confirmed.can_cancel());
        assert!(!BookingStatus::Cancelled.can_cancel());
        assert!(!BookingStatus::Completed.can_cancel());
        assert!(!BookingStatus::Failed.can_cancel());
    }

    #[test]
    fn test_is_terminal() {
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(!BookingStatus::Confirmed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Failed.is_terminal());
    }

    #[test]
    fn test_transitions() {
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Confirmed));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::Cancelled));
        assert!(!BookingStatus::Cancelled.can_transition_to(BookingStatus::Confirmed));
        assert!(!BookingStatus::Completed.can_transition_to(BookingStatus::Cancelled));
        assert!(!BookingStatus::Confirmed.can_transition_to(BookingStatus::Pending));
    }

    #[test]
    fn test_wire_names_round_trip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
            BookingStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
            assert_eq!(
                serde_json::to_string(&status).unwrap(),
                format!("\"{}\"", status.as_str())
            );
        }
        assert!("BOOKED".parse::<BookingStatus>().is_err());
    }
}
