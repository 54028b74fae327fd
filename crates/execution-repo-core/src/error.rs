// crates/execution-repo-core/src/error.rs
// ============================================================================
// Module: Execution Repository Errors
// Description: Domain-level error type returned by the repository interface.
// Purpose: Give collaborators a stable, backend-independent error surface.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`RepositoryError`] is the only error type the [`crate::interfaces`] trait
//! exposes. Backend-specific failures (a Redis transport error, a connection
//! timeout) are converted into [`RepositoryError::BackendError`] at the
//! implementation boundary, mirroring how a backend-specific error converts
//! into a domain error one layer up (§7).

// ============================================================================
// SECTION: RepositoryError
// ============================================================================

/// Domain-level error returned by every [`crate::interfaces::ExecutionRepository`]
/// operation (§7).
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The requested execution, stage, or correlation id does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested operation is not valid given the aggregate's current
    /// state (e.g. adding a non-synthetic stage, canceling a completed
    /// execution).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A caller-supplied argument fails validation before any backend call
    /// is made.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The backend failed in a way the repository could not recover from
    /// (transport error, exhausted optimistic-locking retries, ...).
    #[error("backend error: {0}")]
    BackendError(String),
}
