// crates/execution-repo-redis/src/backend.rs
// ============================================================================
// Module: Backend Router
// Description: Holds the primary and optional previous Redis connections and
//              the key-naming scheme shared by every other module.
// Purpose: Centralize dual-backend routing for rolling migrations (§4.1).
// Dependencies: redis, crate::config, crate::error
// ============================================================================

//! ## Overview
//! Every write targets the primary backend only. Reads consult the primary
//! first; when the primary has no record, the previous backend (if
//! configured) is consulted as a fallback so executions written before a
//! migration remain readable (§4.1). On a conflict — both backends holding
//! a record for the same id — the primary always wins.

// ============================================================================
// SECTION: Imports
// ============================================================================

use redis::aio::ConnectionManager;
use redis::aio::ConnectionManagerConfig;
use execution_repo_core::ApplicationId;
use execution_repo_core::CorrelationId;
use execution_repo_core::ExecutionId;
use execution_repo_core::ExecutionType;
use execution_repo_core::PipelineConfigId;
use execution_repo_core::StageId;

use crate::config::RedisRepositoryConfig;
use crate::error::RedisBackendError;

// ============================================================================
// SECTION: Key Scheme
// ============================================================================

/// Returns the hash key holding an execution's flat and stage-namespaced
/// fields (§4.2).
#[must_use]
pub fn execution_key(execution_type: ExecutionType, id: &ExecutionId) -> String {
    format!("{}:{}", execution_type.key_prefix(), id.as_str())
}

/// Returns the list key holding an execution's authoritative ordered stage
/// id list (§3 invariant 2, §6, §9).
#[must_use]
pub fn stage_order_key(execution_type: ExecutionType, id: &ExecutionId) -> String {
    format!("{}:{}:stageIndex", execution_type.key_prefix(), id.as_str())
}

/// Returns the set key indexing every execution id of `execution_type`
/// belonging to `application` (§4.6).
#[must_use]
pub fn application_index_key(execution_type: ExecutionType, application: &ApplicationId) -> String {
    format!("{}:app:{}", execution_type.key_prefix(), application.as_str())
}

/// Returns the set key holding every execution id of `execution_type`,
/// used for unordered full-type streaming (§4.6, §6).
#[must_use]
pub fn all_jobs_key(execution_type: ExecutionType) -> String {
    format!("allJobs:{}", execution_type.key_prefix())
}

/// Returns the sorted-set key indexing every pipeline execution id started
/// from `pipeline_config_id`, scored by build time (§4.6, §6).
#[must_use]
pub fn pipeline_config_index_key(pipeline_config_id: &PipelineConfigId) -> String {
    format!("pipeline:executions:{}", pipeline_config_id.as_str())
}

/// Sentinel pipeline configuration id used to index executions triggered
/// without a configured pipeline (§6).
pub const UNCONFIGURED_PIPELINE_CONFIG_ID: &str = "---";

/// Returns the string key mapping a correlation id to its in-flight
/// orchestration id (§4.7).
#[must_use]
pub fn correlation_key(correlation_id: &CorrelationId) -> String {
    format!("correlation:{}", correlation_id.as_str())
}

/// Returns the stage-id hash field used to namespace one stage's fields.
#[must_use]
pub fn stage_namespace(stage_id: &StageId) -> String {
    format!("stage.{}", stage_id.as_str())
}

// ============================================================================
// SECTION: BackendRouter
// ============================================================================

/// Which physical backend produced a record, for diagnostics and for the
/// self-healing index cleanup in the Query Streamer (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendLabel {
    /// The primary backend.
    Primary,
    /// The previous backend.
    Previous,
}

/// Holds the live connections to both backends and performs primary/previous
/// routing (§4.1).
#[derive(Clone)]
pub struct BackendRouter {
    /// Unmultiplexed client for the primary backend, used to open the
    /// dedicated connections transactional operations require.
    primary_client: redis::Client,
    /// Multiplexed connection to the primary backend.
    primary: ConnectionManager,
    /// Multiplexed connection to the previous backend, when configured.
    previous: Option<ConnectionManager>,
}

impl BackendRouter {
    /// Connects to the primary backend, and to the previous backend when
    /// configured.
    ///
    /// # Errors
    /// Returns [`RedisBackendError::Transport`] if either connection fails.
    pub async fn connect(config: &RedisRepositoryConfig) -> Result<Self, RedisBackendError> {
        let manager_config = ConnectionManagerConfig::new()
            .set_response_timeout(std::time::Duration::from_millis(config.command_timeout_ms));
        let primary_client = redis::Client::open(config.primary_url.as_str())?;
        let primary = ConnectionManager::new_with_config(primary_client.clone(), manager_config.clone()).await?;
        let previous = match &config.previous_url {
            Some(url) => {
                let client = redis::Client::open(url.as_str())?;
                Some(ConnectionManager::new_with_config(client, manager_config).await?)
            }
            None => None,
        };
        Ok(Self { primary_client, primary, previous })
    }

    /// Returns a handle to the primary connection.
    #[must_use]
    pub fn primary(&self) -> ConnectionManager {
        self.primary.clone()
    }

    /// Opens a fresh, non-multiplexed connection to the primary backend for
    /// use with `WATCH`/`MULTI`/`EXEC` (§4.5 `storeExecutionContext`). A
    /// dedicated connection is required because [`ConnectionManager`]
    /// multiplexes unrelated callers and cannot honor per-connection
    /// transaction state.
    ///
    /// # Errors
    /// Returns [`RedisBackendError::Transport`] if the connection fails.
    pub async fn primary_exclusive(&self) -> Result<redis::aio::MultiplexedConnection, RedisBackendError> {
        Ok(self.primary_client.get_multiplexed_async_connection().await?)
    }

    /// Returns a handle to the previous connection, if configured.
    #[must_use]
    pub fn previous(&self) -> Option<ConnectionManager> {
        self.previous.clone()
    }

    /// Returns every configured backend labeled, primary first, for
    /// fan-out reads (§4.1, §4.6).
    #[must_use]
    pub fn all(&self) -> Vec<(BackendLabel, ConnectionManager)> {
        let mut backends = vec![(BackendLabel::Primary, self.primary.clone())];
        if let Some(previous) = &self.previous {
            backends.push((BackendLabel::Previous, previous.clone()));
        }
        backends
    }
}
