// crates/execution-repo-redis/src/correlation.rs
// ============================================================================
// Module: Correlation Index
// Description: Resolves an in-flight orchestration from an external
//              correlation key.
// Purpose: Implement retrieveOrchestrationForCorrelationId (§4.7).
// Dependencies: redis, crate::backend, crate::reader
// ============================================================================

//! ## Overview
//! `correlation:<key>` holds the orchestration id registered for a
//! correlation key while that orchestration is incomplete (§3 invariant 4).
//! The entry is written by the Aggregate Writer when an orchestration is
//! first stored with a correlation id, and cleared by the Lifecycle
//! Controller once the orchestration reaches a complete status or is
//! deleted (§4.5, §4.7).

// ============================================================================
// SECTION: Imports
// ============================================================================

use execution_repo_core::CorrelationId;
use execution_repo_core::Execution;
use execution_repo_core::ExecutionId;
use execution_repo_core::ExecutionType;
use execution_repo_core::RepositoryError;
use redis::AsyncCommands;

use crate::backend::correlation_key;
use crate::backend::BackendRouter;
use crate::error::RedisBackendError;
use crate::reader;

/// Resolves the in-flight orchestration registered under `correlation_id`,
/// if any (§4.7).
///
/// # Errors
/// Returns [`RepositoryError::NotFound`] if no orchestration is registered
/// under `correlation_id`, or if the registered orchestration has since
/// completed.
pub async fn retrieve_orchestration_for_correlation_id(
    router: &BackendRouter,
    correlation_id: &CorrelationId,
) -> Result<Execution, RepositoryError> {
    let key = correlation_key(correlation_id);
    let raw_id: Option<String> = router.primary().get(&key).await.map_err(RedisBackendError::from)?;
    let raw_id = match raw_id {
        Some(raw_id) => raw_id,
        None => match router.previous() {
            Some(mut previous) => {
                let fallback: Option<String> = previous.get(&key).await.map_err(RedisBackendError::from)?;
                fallback.ok_or_else(|| {
                    RepositoryError::NotFound(format!("no orchestration registered for correlation {correlation_id}"))
                })?
            }
            None => {
                return Err(RepositoryError::NotFound(format!(
                    "no orchestration registered for correlation {correlation_id}"
                )));
            }
        },
    };
    let execution_id = ExecutionId::new(raw_id);
    let execution = reader::retrieve(router, ExecutionType::Orchestration, &execution_id).await?;
    if execution.status.complete() {
        clear(router.primary(), correlation_id).await?;
        return Err(RepositoryError::NotFound(format!(
            "orchestration registered for correlation {correlation_id} has already completed"
        )));
    }
    Ok(execution)
}

/// Registers an orchestration under its trigger's correlation id, if any
/// (§4.3 `storeExecution`).
///
/// # Errors
/// Returns [`RepositoryError::BackendError`] on backend failure.
pub async fn register(
    mut conn: redis::aio::ConnectionManager,
    correlation_id: &CorrelationId,
    execution_id: &ExecutionId,
) -> Result<(), RepositoryError> {
    let key = correlation_key(correlation_id);
    let () = conn.set(&key, execution_id.as_str()).await.map_err(RedisBackendError::from)?;
    Ok(())
}

/// Clears a correlation entry once its orchestration completes or is
/// deleted (§4.5, §3 invariant 4).
///
/// # Errors
/// Returns [`RepositoryError::BackendError`] on backend failure.
pub async fn clear(mut conn: redis::aio::ConnectionManager, correlation_id: &CorrelationId) -> Result<(), RepositoryError> {
    let key = correlation_key(correlation_id);
    let () = conn.del(&key).await.map_err(RedisBackendError::from)?;
    Ok(())
}
