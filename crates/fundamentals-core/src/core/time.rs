// crates/fundamentals-core/src/core/time.rs
// ============================================================================
// Module: Fundamentals Observation Dates
// Description: Calendar dates used as the key of metric observations.
// Purpose: Produce and validate ISO `YYYY-MM-DD` keys from a pluggable clock.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Observations are keyed by the calendar date of the caller's local clock.
//! Keys compare as exact strings; no timezone normalization is applied. The
//! clock is injected through [`DateSource`] so hosts and tests can pin dates.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use ::time::Date;
use ::time::OffsetDateTime;
use ::time::macros::format_description;

// ============================================================================
// SECTION: Observation Date
// ============================================================================

/// Calendar date rendered as ISO `YYYY-MM-DD`.
///
/// # Invariants
/// - Always a valid proleptic Gregorian date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObservationDate(Date);

impl ObservationDate {
    /// Wraps a calendar date.
    #[must_use]
    pub const fn new(date: Date) -> Self {
        Self(date)
    }

    /// Returns today's date on the local clock, falling back to UTC when the
    /// local offset cannot be determined.
    #[must_use]
    pub fn today() -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Self(now.date())
    }

    /// Parses an ISO `YYYY-MM-DD` string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDate`] when the string is not a valid date.
    pub fn parse(value: &str) -> Result<Self, InvalidDate> {
        Date::parse(value, format_description!("[year]-[month]-[day]"))
            .map(Self)
            .map_err(|err| InvalidDate(format!("{value}: {err}")))
    }

    /// Returns the wrapped date.
    #[must_use]
    pub const fn date(self) -> Date {
        self.0
    }

    /// Returns the ISO key string.
    #[must_use]
    pub fn key(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ObservationDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.0.year(), u8::from(self.0.month()), self.0.day())
    }
}

impl TryFrom<String> for ObservationDate {
    type Error = InvalidDate;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ObservationDate> for String {
    fn from(value: ObservationDate) -> Self {
        value.to_string()
    }
}

/// Error returned for malformed observation dates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid observation date: {0}")]
pub struct InvalidDate(pub String);

// ============================================================================
// SECTION: Date Sources
// ============================================================================

/// Supplies the observation date for new metric rows.
pub trait DateSource {
    /// Returns the date to key the next observation with.
    fn today(&self) -> ObservationDate;
}

/// Reads the date from the host's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl DateSource for LocalClock {
    fn today(&self) -> ObservationDate {
        ObservationDate::today()
    }
}

/// Always returns the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDate(pub ObservationDate);

impl DateSource for FixedDate {
    fn today(&self) -> ObservationDate {
        self.0
    }
}
