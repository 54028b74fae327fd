// crates/execution-repo-redis/src/error.rs
// ============================================================================
// Module: Redis Backend Errors
// Description: Transport-level error type for the Redis-backed repository.
// Purpose: Translate `redis` crate failures into a typed, domain-friendly
//          error before they cross into `RepositoryError` (§7).
// Dependencies: redis, thiserror, execution_repo_core::RepositoryError
// ============================================================================

//! ## Overview
//! [`RedisBackendError`] stays internal to this crate; every public
//! repository method converts it into [`RepositoryError`] at the boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use execution_repo_core::RepositoryError;
use thiserror::Error;

// ============================================================================
// SECTION: RedisBackendError
// ============================================================================

/// Errors internal to the Redis backend.
#[derive(Debug, Error, Clone)]
pub enum RedisBackendError {
    /// Connection or protocol failure talking to Redis.
    #[error("redis transport error: {0}")]
    Transport(String),
    /// Configuration failed validation.
    #[error("redis backend invalid configuration: {0}")]
    Invalid(String),
    /// A field map read back from Redis could not be decoded into the
    /// domain model.
    #[error("redis backend decode error: {0}")]
    Decode(String),
    /// An optimistic-concurrency transaction exhausted its retry budget.
    #[error("redis backend transaction conflict after {attempts} attempts")]
    TransactionConflict {
        /// Number of attempts made before giving up.
        attempts: u32,
    },
    /// The requested record does not exist on this backend.
    #[error("redis backend record not found: {0}")]
    NotFound(String),
}

impl From<redis::RedisError> for RedisBackendError {
    fn from(error: redis::RedisError) -> Self {
        Self::Transport(error.to_string())
    }
}

impl From<RedisBackendError> for RepositoryError {
    fn from(error: RedisBackendError) -> Self {
        match error {
            RedisBackendError::NotFound(message) => Self::NotFound(message),
            RedisBackendError::Invalid(message) => Self::InvalidArgument(message),
            RedisBackendError::Decode(message) => Self::BackendError(format!("decode error: {message}")),
            RedisBackendError::TransactionConflict { attempts } => {
                Self::BackendError(format!("transaction conflict after {attempts} attempts"))
            }
            RedisBackendError::Transport(message) => Self::BackendError(message),
        }
    }
}
