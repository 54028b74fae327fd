// crates/execution-repo-redis/src/reader.rs
// ============================================================================
// Module: Aggregate Reader
// Description: Reads a single execution, trying the primary backend first.
// Purpose: Implement retrieve (§4.4).
// Dependencies: redis, crate::backend, crate::codec, crate::error
// ============================================================================

//! ## Overview
//! `retrieve` consults the primary backend; only when the primary has no
//! record does it fall back to the previous backend (§4.1). A record found
//! on the previous backend is returned as-is — it is not copied forward to
//! the primary, since migrating data is out of scope (§3 Non-goals).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;

use execution_repo_core::Execution;
use execution_repo_core::ExecutionId;
use execution_repo_core::ExecutionType;
use execution_repo_core::RepositoryError;
use execution_repo_core::StageId;
use redis::AsyncCommands;

use crate::backend::execution_key;
use crate::backend::stage_order_key;
use crate::backend::BackendRouter;
use crate::codec;
use crate::error::RedisBackendError;

/// Fetches and decodes the execution hash at `key` from `conn`, if present.
///
/// Reads the authoritative ordered stage-id list alongside the hash so
/// [`codec::decode_execution`] can prefer it over the denormalized
/// `stageIndex` hash field (§4.4).
///
/// # Errors
/// Returns [`RepositoryError::BackendError`] on transport failure or decode
/// failure.
pub async fn fetch(
    mut conn: redis::aio::ConnectionManager,
    execution_type: ExecutionType,
    id: &ExecutionId,
) -> Result<Option<Execution>, RepositoryError> {
    let key = execution_key(execution_type, id);
    let fields: HashMap<String, String> = conn.hgetall(&key).await.map_err(RedisBackendError::from)?;
    if fields.is_empty() {
        return Ok(None);
    }
    let order_key = stage_order_key(execution_type, id);
    let ordered_stage_ids: Vec<String> = conn.lrange(&order_key, 0, -1).await.map_err(RedisBackendError::from)?;
    let ordered_stage_ids: Vec<StageId> = ordered_stage_ids.into_iter().map(StageId::new).collect();
    let execution =
        codec::decode_execution(execution_type, id, &fields, &ordered_stage_ids).map_err(RepositoryError::from)?;
    Ok(Some(execution))
}

/// Retrieves a single execution by id, trying the primary backend first and
/// falling back to the previous backend only on a primary miss (§4.1, §4.4).
///
/// # Errors
/// Returns [`RepositoryError::NotFound`] if no backend holds a record for
/// `id`.
pub async fn retrieve(
    router: &BackendRouter,
    execution_type: ExecutionType,
    id: &ExecutionId,
) -> Result<Execution, RepositoryError> {
    if let Some(execution) = fetch(router.primary(), execution_type, id).await? {
        return Ok(execution);
    }
    if let Some(previous) = router.previous()
        && let Some(execution) = fetch(previous, execution_type, id).await?
    {
        return Ok(execution);
    }
    Err(RepositoryError::NotFound(format!("execution {id} not found")))
}
