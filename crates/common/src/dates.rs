//! Stay date ranges.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A stay from `start_date` (check-in) to `end_date` (check-out).
///
/// The range is not validated on construction; the booking saga enforces
/// `end_date > start_date` and the maximum stay length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    /// Creates a date range.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// Returns true if the end date is strictly after the start date.
    pub fn is_ordered(&self) -> bool {
        self.end_date > self.start_date
    }

    /// Number of nights in the stay. Negative for an inverted range.
    pub fn nights(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start_date, self.end_date)
    }
}
