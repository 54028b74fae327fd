// crates/execution-repo-redis/src/writer.rs
// ============================================================================
// Module: Aggregate Writer
// Description: Writes executions and stages to the primary backend.
// Purpose: Implement storeExecution/storeStage/updateStageContext/addStage/
//          removeStage (§4.3).
// Dependencies: redis, crate::backend, crate::codec, crate::error
// ============================================================================

//! ## Overview
//! All writes target the primary backend exclusively (§4.1); the previous
//! backend is never mutated. `addStage`/`removeStage` maintain the
//! authoritative ordered stage-id list (a Redis list) and the denormalized
//! `stageIndex` hash field together, in that order, so a reader observing
//! the gap sees, at worst, a `stageIndex` that is one write behind the list
//! (§9 Open Question).

// ============================================================================
// SECTION: Imports
// ============================================================================

use execution_repo_core::Execution;
use execution_repo_core::PipelineConfigId;
use execution_repo_core::ExecutionId;
use execution_repo_core::ExecutionType;
use execution_repo_core::RepositoryError;
use execution_repo_core::Stage;
use execution_repo_core::StageId;
use execution_repo_core::SyntheticStageOwner;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::backend::all_jobs_key;
use crate::backend::application_index_key;
use crate::backend::execution_key;
use crate::backend::pipeline_config_index_key;
use crate::backend::stage_order_key;
use crate::backend::UNCONFIGURED_PIPELINE_CONFIG_ID;
use crate::codec;
use crate::error::RedisBackendError;

/// Persists a new execution or fully overwrites an existing one, including
/// every stage it currently owns, and refreshes its index entries (§4.3).
///
/// # Errors
/// Returns [`RepositoryError::BackendError`] on backend failure.
pub async fn store_execution(mut conn: ConnectionManager, execution: &Execution) -> Result<(), RepositoryError> {
    let key = execution_key(execution.execution_type, &execution.id);
    let mut fields = codec::encode_execution_fields(execution).map_err(RepositoryError::from)?;
    for stage in &execution.stages {
        fields.extend(codec::encode_stage_fields(stage).map_err(RepositoryError::from)?);
    }
    let order_key = stage_order_key(execution.execution_type, &execution.id);
    let stage_ids: Vec<String> = execution.stages.iter().map(|stage| stage.id.as_str().to_string()).collect();

    let previous_stage_ids: Vec<String> = conn.lrange(&order_key, 0, -1).await.map_err(RedisBackendError::from)?;
    let kept: std::collections::HashSet<&str> = stage_ids.iter().map(String::as_str).collect();
    let stale_fields: Vec<String> = previous_stage_ids
        .iter()
        .filter(|id| !kept.contains(id.as_str()))
        .flat_map(|id| codec::stage_field_names(&StageId::new(id.clone())))
        .collect();

    let () = conn.hset_multiple(&key, &fields).await.map_err(RedisBackendError::from)?;
    let () = conn.hdel(&key, "config").await.map_err(RedisBackendError::from)?;
    if !stale_fields.is_empty() {
        let () = conn.hdel(&key, &stale_fields).await.map_err(RedisBackendError::from)?;
    }
    let () = conn.del(&order_key).await.map_err(RedisBackendError::from)?;
    if !stage_ids.is_empty() {
        let _: i64 = conn.rpush(&order_key, &stage_ids).await.map_err(RedisBackendError::from)?;
    }

    let () = conn
        .sadd(application_index_key(execution.execution_type, &execution.application), execution.id.as_str())
        .await
        .map_err(RedisBackendError::from)?;
    let () = conn
        .sadd(all_jobs_key(execution.execution_type), execution.id.as_str())
        .await
        .map_err(RedisBackendError::from)?;
    if let Some(pipeline) = &execution.pipeline {
        let config_id = pipeline
            .pipeline_config_id
            .clone()
            .unwrap_or_else(|| PipelineConfigId::new(UNCONFIGURED_PIPELINE_CONFIG_ID));
        let () = conn
            .zadd::<_, _, _, ()>(pipeline_config_index_key(&config_id), execution.id.as_str(), execution.build_time.as_millis())
            .await
            .map_err(RedisBackendError::from)?;
    }
    if execution.execution_type == ExecutionType::Orchestration
        && let Some(correlation_id) = codec::trigger_correlation_id(&execution.trigger)
    {
        crate::correlation::register(conn, correlation_id, &execution.id).await?;
    }
    Ok(())
}

/// Persists a single stage within an already-stored execution (§4.3).
///
/// # Errors
/// Returns [`RepositoryError::NotFound`] if the owning execution does not
/// exist, or [`RepositoryError::BackendError`] on backend failure.
pub async fn store_stage(
    mut conn: ConnectionManager,
    execution_type: ExecutionType,
    execution_id: &ExecutionId,
    stage: &Stage,
) -> Result<(), RepositoryError> {
    let key = execution_key(execution_type, execution_id);
    let exists: bool = conn.exists(&key).await.map_err(RedisBackendError::from)?;
    if !exists {
        return Err(RepositoryError::NotFound(format!("execution {execution_id} not found")));
    }
    let fields = codec::encode_stage_fields(stage).map_err(RepositoryError::from)?;
    let () = conn.hset_multiple(&key, &fields).await.map_err(RedisBackendError::from)?;
    Ok(())
}

/// Replaces a stage's `context` map in place (§4.3).
///
/// # Errors
/// Returns [`RepositoryError::NotFound`] if the stage does not exist.
pub async fn update_stage_context(
    mut conn: ConnectionManager,
    execution_type: ExecutionType,
    execution_id: &ExecutionId,
    stage_id: &StageId,
    context: serde_json::Map<String, serde_json::Value>,
) -> Result<(), RepositoryError> {
    let key = execution_key(execution_type, execution_id);
    let field = codec::stage_field(stage_id, "context");
    let field_exists: bool = conn.hexists(&key, &field).await.map_err(RedisBackendError::from)?;
    if !field_exists {
        return Err(RepositoryError::NotFound(format!("stage {stage_id} not found in execution {execution_id}")));
    }
    let encoded = serde_json::to_string(&context).map_err(|error| RedisBackendError::Decode(error.to_string()))?;
    let () = conn.hset(&key, &field, encoded).await.map_err(RedisBackendError::from)?;
    Ok(())
}

/// Splices a synthetic stage into an execution's ordered stage list (§4.3).
///
/// # Errors
/// Returns [`RepositoryError::InvalidArgument`] if `stage` is not synthetic,
/// or [`RepositoryError::NotFound`] if the owning execution or
/// `stage.parent_stage_id` does not exist, or if the ordered stage list does
/// not exist.
///
/// # Panics
/// Never panics: the synthetic check above guarantees `parent_stage_id`
/// is `Some` before it is unwrapped.
pub async fn add_stage(
    mut conn: ConnectionManager,
    execution_type: ExecutionType,
    execution_id: &ExecutionId,
    stage: Stage,
) -> Result<(), RepositoryError> {
    if !stage.is_synthetic() {
        return Err(RepositoryError::InvalidArgument("addStage requires a synthetic stage with a parent".to_string()));
    }
    let key = execution_key(execution_type, execution_id);
    let exists: bool = conn.exists(&key).await.map_err(RedisBackendError::from)?;
    if !exists {
        return Err(RepositoryError::NotFound(format!("execution {execution_id} not found")));
    }
    #[expect(clippy::unwrap_used, reason = "is_synthetic() guarantees parent_stage_id is Some")]
    let parent_id = stage.parent_stage_id.clone().unwrap();

    let order_key = stage_order_key(execution_type, execution_id);
    let pivot = parent_id.as_str().to_string();
    let inserted: i64 = match stage.synthetic_stage_owner {
        SyntheticStageOwner::StageBefore => conn
            .linsert_before(&order_key, &pivot, stage.id.as_str())
            .await
            .map_err(RedisBackendError::from)?,
        SyntheticStageOwner::StageAfter => conn
            .linsert_after(&order_key, &pivot, stage.id.as_str())
            .await
            .map_err(RedisBackendError::from)?,
        SyntheticStageOwner::Unset => unreachable!("is_synthetic() excludes Unset"),
    };
    if inserted < 0 {
        return Err(RepositoryError::NotFound(format!("parent stage {parent_id} not found in ordered stage list")));
    }
    if inserted == 0 {
        return Err(RepositoryError::NotFound(format!("ordered stage list for execution {execution_id} does not exist")));
    }

    let fields = codec::encode_stage_fields(&stage).map_err(RepositoryError::from)?;
    let () = conn.hset_multiple(&key, &fields).await.map_err(RedisBackendError::from)?;
    refresh_stage_index(&mut conn, &key, &order_key).await
}

/// Removes a stage and its namespaced fields from an execution (§4.3).
///
/// # Errors
/// Returns [`RepositoryError::NotFound`] if the stage does not exist.
pub async fn remove_stage(
    mut conn: ConnectionManager,
    execution_type: ExecutionType,
    execution_id: &ExecutionId,
    stage_id: &StageId,
) -> Result<(), RepositoryError> {
    let key = execution_key(execution_type, execution_id);
    let order_key = stage_order_key(execution_type, execution_id);
    let removed: i64 = conn.lrem(&order_key, 0, stage_id.as_str()).await.map_err(RedisBackendError::from)?;
    if removed == 0 {
        return Err(RepositoryError::NotFound(format!("stage {stage_id} not found in execution {execution_id}")));
    }
    let field_names = codec::stage_field_names(stage_id);
    let () = conn.hdel(&key, &field_names).await.map_err(RedisBackendError::from)?;
    refresh_stage_index(&mut conn, &key, &order_key).await
}

/// Rewrites the denormalized `stageIndex` hash field from the authoritative
/// ordered list (§9 Open Question resolution).
async fn refresh_stage_index(
    conn: &mut ConnectionManager,
    execution_key: &str,
    order_key: &str,
) -> Result<(), RepositoryError> {
    let ids: Vec<String> = conn.lrange(order_key, 0, -1).await.map_err(RedisBackendError::from)?;
    let () = conn.hset(execution_key, "stageIndex", ids.join(",")).await.map_err(RedisBackendError::from)?;
    Ok(())
}
