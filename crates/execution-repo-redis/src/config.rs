// crates/execution-repo-redis/src/config.rs
// ============================================================================
// Module: Redis Repository Configuration
// Description: Connection and tuning parameters for the Redis-backed
//              execution repository.
// Purpose: Collect every knob a deployment needs to set in one validated
//          struct (§4.1, §4.6).
// Dependencies: crate::error, serde
// ============================================================================

//! ## Overview
//! [`RedisRepositoryConfig`] configures both backends (primary, and an
//! optional previous backend consulted during rolling migrations, §4.1) and
//! the Query Streamer's chunking and concurrency bounds (§4.6).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;

use crate::error::RedisBackendError;

// ============================================================================
// SECTION: RedisRepositoryConfig
// ============================================================================

/// Configuration for the Redis-backed execution repository.
///
/// # Invariants
/// - `chunk_size`, `query_all_pool_size`, and `query_by_app_pool_size` must
///   be greater than zero.
/// - `transaction_max_retries` of `0` disables retrying
///   `store_execution_context` under contention.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisRepositoryConfig {
    /// Connection URL for the primary backend; every write targets this
    /// backend (§4.1).
    pub primary_url: String,
    /// Connection URL for the previous backend, consulted on read only
    /// when the primary holds no record (§4.1). `None` disables dual-read.
    #[serde(default)]
    pub previous_url: Option<String>,
    /// Number of executions fetched per chunk during streaming retrieval
    /// (§4.6). Defaults to `75`.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Maximum number of concurrent in-flight fetches within a chunk for a
    /// whole-type scan of `allJobs:<type>` (§5). Defaults to `10`.
    #[serde(default = "default_query_all_pool_size")]
    pub query_all_pool_size: usize,
    /// Maximum number of concurrent in-flight fetches within a chunk for an
    /// application- or pipeline-config-scoped query (§5). Defaults to `32`.
    #[serde(default = "default_query_by_app_pool_size")]
    pub query_by_app_pool_size: usize,
    /// Per-command timeout in milliseconds.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    /// Maximum optimistic-concurrency retries for `store_execution_context`
    /// (§4.5). Defaults to `5`.
    #[serde(default = "default_transaction_max_retries")]
    pub transaction_max_retries: u32,
}

/// Returns the default chunk size for streaming retrieval (§4.6).
const fn default_chunk_size() -> usize {
    75
}

/// Returns the default bound on concurrent in-flight fetches for a
/// whole-table scan (§5).
const fn default_query_all_pool_size() -> usize {
    10
}

/// Returns the default bound on concurrent in-flight fetches for an
/// application/pipeline-scoped query (§5).
const fn default_query_by_app_pool_size() -> usize {
    32
}

/// Returns the default per-command timeout in milliseconds.
const fn default_command_timeout_ms() -> u64 {
    2_000
}

/// Returns the default optimistic-concurrency retry budget.
const fn default_transaction_max_retries() -> u32 {
    5
}

impl RedisRepositoryConfig {
    /// Creates a config with only a primary backend and otherwise default
    /// tuning.
    #[must_use]
    pub fn new(primary_url: impl Into<String>) -> Self {
        Self {
            primary_url: primary_url.into(),
            previous_url: None,
            chunk_size: default_chunk_size(),
            query_all_pool_size: default_query_all_pool_size(),
            query_by_app_pool_size: default_query_by_app_pool_size(),
            command_timeout_ms: default_command_timeout_ms(),
            transaction_max_retries: default_transaction_max_retries(),
        }
    }

    /// Validates tuning parameters.
    ///
    /// # Errors
    /// Returns [`RedisBackendError::Invalid`] if any bound is zero.
    pub fn validate(&self) -> Result<(), RedisBackendError> {
        if self.chunk_size == 0 {
            return Err(RedisBackendError::Invalid("chunk_size must be greater than zero".to_string()));
        }
        if self.query_all_pool_size == 0 {
            return Err(RedisBackendError::Invalid(
                "query_all_pool_size must be greater than zero".to_string(),
            ));
        }
        if self.query_by_app_pool_size == 0 {
            return Err(RedisBackendError::Invalid(
                "query_by_app_pool_size must be greater than zero".to_string(),
            ));
        }
        if self.command_timeout_ms == 0 {
            return Err(RedisBackendError::Invalid(
                "command_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
