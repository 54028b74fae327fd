// crates/execution-repo-core/src/core/time.rs
// ============================================================================
// Module: Execution Repository Time Model
// Description: Canonical timestamp representation for executions and stages.
// Purpose: Provide a single millisecond-precision wall-clock timestamp type.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! All execution and stage timestamps (`buildTime`, `startTime`, `endTime`,
//! `scheduledTime`, pause/resume times, §3) are wall-clock values in
//! milliseconds since the Unix epoch. The repository writes `now()` at the
//! point of mutation (§4.5); it never derives time from stored data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Millisecond-precision Unix timestamp.
///
/// # Invariants
/// - Represents milliseconds since the Unix epoch; no timezone is implied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from raw Unix milliseconds.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the wall-clock timestamp for the current instant.
    #[must_use]
    pub fn now() -> Self {
        let duration = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        Self(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
    }

    /// Returns the raw Unix-milliseconds value.
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, reason = "Unit tests use expect/unwrap for setup clarity.")]

    use super::*;

    #[test]
    fn from_millis_roundtrips() {
        let timestamp = Timestamp::from_millis(1_700_000_000_000);
        assert_eq!(timestamp.as_millis(), 1_700_000_000_000);
    }

    #[test]
    fn now_is_monotonic_with_a_later_call() {
        let first = Timestamp::now();
        let second = Timestamp::now();
        assert!(second >= first);
    }

    #[test]
    fn ordering_matches_millisecond_value() {
        let earlier = Timestamp::from_millis(1_000);
        let later = Timestamp::from_millis(2_000);
        assert!(earlier < later);
    }
}
