// crates/execution-repo-redis/src/lifecycle.rs
// ============================================================================
// Module: Lifecycle Controller
// Description: Status transitions, cancellation, pause/resume, deletion, and
//              optimistic-concurrency context updates.
// Purpose: Implement cancel/pause/resume/updateStatus/delete/
//          storeExecutionContext/isCanceled (§4.5).
// Dependencies: redis, crate::backend, crate::codec, crate::error
// ============================================================================

//! ## Overview
//! Every lifecycle operation targets the primary backend only (§4.1).
//! `storeExecutionContext` is the one operation requiring true atomicity
//! against concurrent writers: it runs under `WATCH`/`MULTI`/`EXEC` on a
//! dedicated connection and retries on conflict up to
//! [`RedisRepositoryConfig::transaction_max_retries`] times (§4.5).

// ============================================================================
// SECTION: Imports
// ============================================================================

use execution_repo_core::ExecutionId;
use execution_repo_core::ExecutionStatus;
use execution_repo_core::ExecutionType;
use execution_repo_core::RepositoryError;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::backend::application_index_key;
use crate::backend::all_jobs_key;
use crate::backend::execution_key;
use crate::backend::pipeline_config_index_key;
use crate::backend::stage_order_key;
use crate::backend::BackendRouter;
use crate::codec;
use crate::config::RedisRepositoryConfig;
use crate::error::RedisBackendError;

/// Marks an execution canceled (§4.5).
///
/// # Errors
/// Returns [`RepositoryError::NotFound`] if the execution does not exist.
pub async fn cancel(
    mut conn: ConnectionManager,
    execution_type: ExecutionType,
    id: &ExecutionId,
    canceled_by: Option<String>,
    reason: Option<String>,
) -> Result<(), RepositoryError> {
    let key = execution_key(execution_type, id);
    let status = read_status(&mut conn, &key, id).await?;
    let mut fields = vec![("canceled".to_string(), "true".to_string())];
    if let Some(by) = canceled_by {
        fields.push(("canceledBy".to_string(), by));
    }
    if let Some(reason) = reason {
        fields.push(("cancellationReason".to_string(), reason));
    }
    if status == ExecutionStatus::NotStarted {
        fields.push(("status".to_string(), codec::status_to_str(ExecutionStatus::Canceled).to_string()));
    }
    let () = conn.hset_multiple(&key, &fields).await.map_err(RedisBackendError::from)?;
    if status == ExecutionStatus::NotStarted
        && execution_type == ExecutionType::Orchestration
        && let Some(correlation_id) = trigger_correlation_id(&mut conn, &key).await?
    {
        crate::correlation::clear(conn, &correlation_id).await?;
    }
    Ok(())
}

/// Pauses a running execution (§4.5).
///
/// # Errors
/// Returns [`RepositoryError::InvalidState`] if the execution is not
/// running, or [`RepositoryError::NotFound`] if it does not exist.
pub async fn pause(
    mut conn: ConnectionManager,
    execution_type: ExecutionType,
    id: &ExecutionId,
    paused_by: Option<String>,
) -> Result<(), RepositoryError> {
    let key = execution_key(execution_type, id);
    let status = read_status(&mut conn, &key, id).await?;
    if status != ExecutionStatus::Running {
        return Err(RepositoryError::InvalidState(format!("execution {id} is not running")));
    }
    let now = execution_repo_core::core::time::Timestamp::now();
    let paused = execution_repo_core::PausedDetails { paused_by, pause_time: Some(now), ..Default::default() };
    let encoded_paused = serde_json::to_string(&paused)
        .map_err(|error| RepositoryError::from(RedisBackendError::Decode(error.to_string())))?;
    let fields = vec![
        ("status".to_string(), codec::status_to_str(ExecutionStatus::Paused).to_string()),
        ("paused".to_string(), encoded_paused),
    ];
    let () = conn.hset_multiple(&key, &fields).await.map_err(RedisBackendError::from)?;
    Ok(())
}

/// Resumes a paused execution (§4.5).
///
/// # Errors
/// Returns [`RepositoryError::InvalidState`] if the execution is not
/// paused, or [`RepositoryError::NotFound`] if it does not exist.
pub async fn resume(
    mut conn: ConnectionManager,
    execution_type: ExecutionType,
    id: &ExecutionId,
    resumed_by: Option<String>,
) -> Result<(), RepositoryError> {
    let key = execution_key(execution_type, id);
    let status = read_status(&mut conn, &key, id).await?;
    if status != ExecutionStatus::Paused {
        return Err(RepositoryError::InvalidState(format!("execution {id} is not paused")));
    }
    let now = execution_repo_core::core::time::Timestamp::now();
    let paused_raw: Option<String> = conn.hget(&key, "paused").await.map_err(RedisBackendError::from)?;
    let mut paused: execution_repo_core::PausedDetails =
        paused_raw.map(|raw| serde_json::from_str(&raw)).transpose().map_err(|error: serde_json::Error| {
            RepositoryError::from(RedisBackendError::Decode(error.to_string()))
        })?.unwrap_or_default();
    paused.resumed_by = resumed_by;
    paused.resume_time = Some(now);
    let fields = vec![
        ("status".to_string(), codec::status_to_str(ExecutionStatus::Running).to_string()),
        (
            "paused".to_string(),
            serde_json::to_string(&paused).map_err(|error| RepositoryError::from(RedisBackendError::Decode(error.to_string())))?,
        ),
    ];
    let () = conn.hset_multiple(&key, &fields).await.map_err(RedisBackendError::from)?;
    Ok(())
}

/// Updates an execution's status, stamping `endTime` when the new status is
/// complete (§4.5).
///
/// # Errors
/// Returns [`RepositoryError::NotFound`] if the execution does not exist.
pub async fn update_status(
    mut conn: ConnectionManager,
    execution_type: ExecutionType,
    id: &ExecutionId,
    status: ExecutionStatus,
) -> Result<(), RepositoryError> {
    let key = execution_key(execution_type, id);
    require_exists(&mut conn, &key, id).await?;
    let mut fields = vec![("status".to_string(), codec::status_to_str(status).to_string())];
    if status.complete() {
        let now = execution_repo_core::core::time::Timestamp::now();
        fields.push(("endTime".to_string(), now.as_millis().to_string()));
    }
    let () = conn.hset_multiple(&key, &fields).await.map_err(RedisBackendError::from)?;
    if status.complete()
        && execution_type == ExecutionType::Orchestration
        && let Some(correlation_id) = trigger_correlation_id(&mut conn, &key).await?
    {
        crate::correlation::clear(conn, &correlation_id).await?;
    }
    Ok(())
}

/// Reads an execution's `trigger` field and extracts its correlation id,
/// if any.
async fn trigger_correlation_id(
    conn: &mut ConnectionManager,
    key: &str,
) -> Result<Option<execution_repo_core::CorrelationId>, RepositoryError> {
    let raw_trigger: Option<String> = conn.hget(key, "trigger").await.map_err(RedisBackendError::from)?;
    let Some(raw_trigger) = raw_trigger else { return Ok(None) };
    let trigger: execution_repo_core::Trigger = serde_json::from_str(&raw_trigger)
        .map_err(|error| RepositoryError::from(RedisBackendError::Decode(error.to_string())))?;
    Ok(trigger.correlation_id)
}

/// Deletes an execution and every index entry referencing it (§4.5).
///
/// # Errors
/// Returns [`RepositoryError::BackendError`] on backend failure. A missing
/// execution is not an error.
pub async fn delete(
    mut conn: ConnectionManager,
    execution_type: ExecutionType,
    id: &ExecutionId,
) -> Result<(), RepositoryError> {
    let key = execution_key(execution_type, id);
    let fields: std::collections::HashMap<String, String> =
        conn.hgetall(&key).await.map_err(RedisBackendError::from)?;
    if fields.is_empty() {
        return Ok(());
    }
    let application = fields.get("application").cloned();
    let pipeline_config_id = fields.get("pipelineConfigId").cloned();
    let correlation_id = fields
        .get("trigger")
        .and_then(|raw| serde_json::from_str::<execution_repo_core::Trigger>(raw).ok())
        .and_then(|trigger| trigger.correlation_id);

    let () = conn.del(&key).await.map_err(RedisBackendError::from)?;
    let () = conn.del(stage_order_key(execution_type, id)).await.map_err(RedisBackendError::from)?;
    let () = conn.srem(all_jobs_key(execution_type), id.as_str()).await.map_err(RedisBackendError::from)?;
    if let Some(application) = application {
        let () = conn
            .srem(application_index_key(execution_type, &execution_repo_core::ApplicationId::new(application)), id.as_str())
            .await
            .map_err(RedisBackendError::from)?;
    }
    if execution_type == ExecutionType::Pipeline {
        let config_id = pipeline_config_id.map_or_else(
            || execution_repo_core::PipelineConfigId::new(crate::backend::UNCONFIGURED_PIPELINE_CONFIG_ID),
            execution_repo_core::PipelineConfigId::new,
        );
        let () = conn.zrem(pipeline_config_index_key(&config_id), id.as_str()).await.map_err(RedisBackendError::from)?;
    }
    if let Some(correlation_id) = correlation_id {
        crate::correlation::clear(conn, &correlation_id).await?;
    }
    Ok(())
}

/// Atomically overwrites an execution's trigger-level context under
/// optimistic concurrency control (§4.5).
///
/// # Errors
/// Returns [`RepositoryError::NotFound`] if the execution does not exist,
/// or [`RepositoryError::BackendError`] if the retry budget is exhausted
/// under contention.
pub async fn store_execution_context(
    router: &BackendRouter,
    config: &RedisRepositoryConfig,
    execution_type: ExecutionType,
    id: &ExecutionId,
    context: serde_json::Map<String, serde_json::Value>,
) -> Result<(), RepositoryError> {
    let key = execution_key(execution_type, id);

    for attempt in 0..=config.transaction_max_retries {
        let mut conn = router.primary_exclusive().await?;
        let (): () = redis::cmd("WATCH").arg(&key).query_async(&mut conn).await.map_err(RedisBackendError::from)?;

        let raw_trigger: Option<String> = conn.hget(&key, "trigger").await.map_err(RedisBackendError::from)?;
        let Some(raw_trigger) = raw_trigger else {
            let (): () = redis::cmd("UNWATCH").query_async(&mut conn).await.map_err(RedisBackendError::from)?;
            return Err(RepositoryError::NotFound(format!("execution {id} not found")));
        };
        let mut trigger: execution_repo_core::Trigger = serde_json::from_str(&raw_trigger)
            .map_err(|error| RepositoryError::from(RedisBackendError::Decode(error.to_string())))?;
        trigger.fields = context.clone();
        let updated_trigger = serde_json::to_string(&trigger)
            .map_err(|error| RepositoryError::from(RedisBackendError::Decode(error.to_string())))?;

        let mut pipeline = redis::pipe();
        pipeline.atomic().hset(&key, "trigger", updated_trigger);
        let result: Option<(i64,)> = pipeline.query_async(&mut conn).await.map_err(RedisBackendError::from)?;
        if result.is_some() {
            return Ok(());
        }
        tracing::debug!(execution_id = %id, attempt, "storeExecutionContext transaction conflict, retrying");
    }
    Err(RepositoryError::from(RedisBackendError::TransactionConflict { attempts: config.transaction_max_retries }))
}

/// Returns whether an execution has been canceled (§4.5).
///
/// # Errors
/// Returns [`RepositoryError::NotFound`] if the execution does not exist.
pub async fn is_canceled(
    mut conn: ConnectionManager,
    execution_type: ExecutionType,
    id: &ExecutionId,
) -> Result<bool, RepositoryError> {
    let key = execution_key(execution_type, id);
    let canceled: Option<String> = conn.hget(&key, "canceled").await.map_err(RedisBackendError::from)?;
    canceled.map_or_else(|| Err(RepositoryError::NotFound(format!("execution {id} not found"))), |raw| Ok(raw == "true"))
}

/// Returns an execution's decoded status, or `NotFound` if it does not
/// exist.
async fn read_status(conn: &mut ConnectionManager, key: &str, id: &ExecutionId) -> Result<ExecutionStatus, RepositoryError> {
    let raw: Option<String> = conn.hget(key, "status").await.map_err(RedisBackendError::from)?;
    raw.map_or_else(
        || Err(RepositoryError::NotFound(format!("execution {id} not found"))),
        |raw| codec::status_from_str(&raw).map_err(RepositoryError::from),
    )
}

/// Returns an error if the execution hash at `key` does not exist.
async fn require_exists(conn: &mut ConnectionManager, key: &str, id: &ExecutionId) -> Result<(), RepositoryError> {
    let exists: bool = conn.exists(key).await.map_err(RedisBackendError::from)?;
    if exists {
        Ok(())
    } else {
        Err(RepositoryError::NotFound(format!("execution {id} not found")))
    }
}
