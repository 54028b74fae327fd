// crates/execution-repo-core/src/core/criteria.rs
// ============================================================================
// Module: Query Criteria
// Description: Caller-supplied filter for streaming retrieval operations.
// Purpose: Bound and pre-filter the Query Streamer's fan-out (§4.6, §6).
// Dependencies: crate::core::model
// ============================================================================

//! ## Overview
//! `QueryCriteria` is applied twice: `statuses` is evaluated against the
//! per-record status without decoding the full aggregate where possible,
//! and `limit` bounds the number of matching executions returned, not the
//! number of records visited (§4.6).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;

use crate::core::model::ExecutionStatus;

// ============================================================================
// SECTION: QueryCriteria
// ============================================================================

/// Filter applied by the streaming retrieval operations (§6).
///
/// # Invariants
/// - An empty `statuses` set means "no status filter", not "match nothing".
/// - `limit` of `None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryCriteria {
    /// Statuses to match; empty means unfiltered.
    pub statuses: HashSet<ExecutionStatus>,
    /// Maximum number of matching executions to return.
    pub limit: Option<usize>,
}

impl QueryCriteria {
    /// Returns criteria with no status filter and no limit.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Returns whether a status satisfies this criteria's status filter.
    #[must_use]
    pub fn matches_status(&self, status: ExecutionStatus) -> bool {
        self.statuses.is_empty() || self.statuses.contains(&status)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, reason = "Unit tests use expect/unwrap for setup clarity.")]

    use super::*;

    #[test]
    fn unbounded_matches_every_status() {
        let criteria = QueryCriteria::unbounded();
        assert!(criteria.matches_status(ExecutionStatus::Running));
        assert!(criteria.matches_status(ExecutionStatus::Succeeded));
    }

    #[test]
    fn non_empty_statuses_filter_to_the_set() {
        let criteria = QueryCriteria { statuses: HashSet::from([ExecutionStatus::Running]), limit: None };
        assert!(criteria.matches_status(ExecutionStatus::Running));
        assert!(!criteria.matches_status(ExecutionStatus::Succeeded));
    }

    #[test]
    fn default_has_no_limit() {
        assert_eq!(QueryCriteria::default().limit, None);
    }
}
