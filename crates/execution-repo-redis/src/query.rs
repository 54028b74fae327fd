// crates/execution-repo-redis/src/query.rs
// ============================================================================
// Module: Query Streamer
// Description: Lazy, chunked, self-healing streaming retrieval across both
//              backends.
// Purpose: Implement retrieve(type)/retrievePipelinesForApplication/
//          retrievePipelinesForPipelineConfigId/
//          retrieveOrchestrationsForApplication (§4.6).
// Dependencies: tokio, tokio-stream, redis, crate::backend, crate::reader
// ============================================================================

//! ## Overview
//! Every streaming operation first gathers candidate execution ids from an
//! index (a Redis set for `allJobs:<type>` and the application indexes; a
//! sorted set scored by build time for the per-pipeline-config index, §6)
//! on each configured backend, then fans out fetches in chunks of
//! `chunk_size` (default 75) bounded by a worker pool sized per query
//! shape: a small pool for the whole-type `allJobs:<type>` scan, and a
//! separately configurable pool for application- and pipeline-config-
//! scoped queries (§5, §4.6). An id that no longer resolves to a record
//! (`NotFound`) is stale — likely left behind by a `delete` that raced the
//! index read — and is removed from the backend index it was found on
//! before the stream continues (self-healing, §4.6).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;
use std::sync::Arc;

use execution_repo_core::ApplicationId;
use execution_repo_core::Execution;
use execution_repo_core::ExecutionId;
use execution_repo_core::ExecutionType;
use execution_repo_core::PipelineConfigId;
use execution_repo_core::ExecutionStream;
use execution_repo_core::QueryCriteria;
use execution_repo_core::RepositoryError;
use redis::AsyncCommands;
use tokio::sync::Semaphore;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::backend::all_jobs_key;
use crate::backend::application_index_key;
use crate::backend::pipeline_config_index_key;
use crate::backend::BackendLabel;
use crate::backend::BackendRouter;
use crate::config::RedisRepositoryConfig;
use crate::error::RedisBackendError;
use crate::reader;

/// Which Redis structure a candidate-id index is backed by, so self-healing
/// issues the matching removal command (§6, §4.6 step 5).
#[derive(Debug, Clone, Copy)]
enum IndexKind {
    /// A plain Redis set (`SADD`/`SREM`/`SMEMBERS`).
    Set,
    /// A Redis sorted set scored by build time (`ZADD`/`ZREM`/`ZREVRANGE`).
    SortedSet,
}

/// Bounded channel depth for the streaming output, sized to a few chunks'
/// worth of executions so producers rarely block on a slow consumer.
const CHANNEL_CAPACITY: usize = 256;

/// Streams every execution of `execution_type` across both backends (§4.6).
#[must_use]
pub fn retrieve_for_type(
    router: Arc<BackendRouter>,
    config: Arc<RedisRepositoryConfig>,
    execution_type: ExecutionType,
    criteria: QueryCriteria,
) -> ExecutionStream {
    let pool_size = config.query_all_pool_size;
    stream_index(router, config, execution_type, all_jobs_key(execution_type), IndexKind::Set, pool_size, criteria)
}

/// Streams pipeline executions for an application (§4.6).
#[must_use]
pub fn retrieve_pipelines_for_application(
    router: Arc<BackendRouter>,
    config: Arc<RedisRepositoryConfig>,
    application: &ApplicationId,
) -> ExecutionStream {
    let index_key = application_index_key(ExecutionType::Pipeline, application);
    let pool_size = config.query_by_app_pool_size;
    stream_index(
        router,
        config,
        ExecutionType::Pipeline,
        index_key,
        IndexKind::Set,
        pool_size,
        QueryCriteria::unbounded(),
    )
}

/// Streams pipeline executions started from a specific pipeline
/// configuration, newest first per backend (§4.6).
#[must_use]
pub fn retrieve_pipelines_for_pipeline_config_id(
    router: Arc<BackendRouter>,
    config: Arc<RedisRepositoryConfig>,
    pipeline_config_id: &PipelineConfigId,
    criteria: QueryCriteria,
) -> ExecutionStream {
    let index_key = pipeline_config_index_key(pipeline_config_id);
    let pool_size = config.query_by_app_pool_size;
    stream_index(router, config, ExecutionType::Pipeline, index_key, IndexKind::SortedSet, pool_size, criteria)
}

/// Streams orchestration executions for an application (§4.6).
#[must_use]
pub fn retrieve_orchestrations_for_application(
    router: Arc<BackendRouter>,
    config: Arc<RedisRepositoryConfig>,
    application: &ApplicationId,
    criteria: QueryCriteria,
) -> ExecutionStream {
    let index_key = application_index_key(ExecutionType::Orchestration, application);
    let pool_size = config.query_by_app_pool_size;
    stream_index(router, config, ExecutionType::Orchestration, index_key, IndexKind::Set, pool_size, criteria)
}

/// Reads every member of `index_key` from one backend connection, in
/// newest-first order when it is a sorted set.
async fn read_index_members(
    mut conn: redis::aio::ConnectionManager,
    index_key: &str,
    kind: IndexKind,
) -> Result<Vec<String>, RedisBackendError> {
    match kind {
        IndexKind::Set => Ok(conn.smembers(index_key).await?),
        IndexKind::SortedSet => Ok(conn.zrevrange(index_key, 0, -1).await?),
    }
}

/// Removes a stale id from the index it was sourced from, on the backend it
/// was found on (§4.6 self-healing).
async fn heal_index(mut conn: redis::aio::ConnectionManager, index_key: &str, kind: IndexKind, id: &str) {
    let outcome: redis::RedisResult<i64> = match kind {
        IndexKind::Set => conn.srem(index_key, id).await,
        IndexKind::SortedSet => conn.zrem(index_key, id).await,
    };
    if let Err(error) = outcome {
        tracing::warn!(index_key, id, %error, "failed to heal stale query index entry");
    }
}

/// Returns a connection to the labeled backend, if still configured.
fn backend_connection(router: &BackendRouter, label: BackendLabel) -> Option<redis::aio::ConnectionManager> {
    match label {
        BackendLabel::Primary => Some(router.primary()),
        BackendLabel::Previous => router.previous(),
    }
}

/// Drives the chunked, bounded-concurrency fan-out for one index across
/// both configured backends and streams matching executions as they
/// resolve (§4.6).
fn stream_index(
    router: Arc<BackendRouter>,
    config: Arc<RedisRepositoryConfig>,
    execution_type: ExecutionType,
    index_key: String,
    kind: IndexKind,
    pool_size: usize,
    criteria: QueryCriteria,
) -> ExecutionStream {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    tokio::spawn(async move {
        if let Err(error) =
            run_stream(router, config, execution_type, index_key, kind, pool_size, criteria, tx.clone()).await
        {
            let _ = tx.send(Err(error)).await;
        }
    });
    Box::pin(ReceiverStream::new(rx))
}

/// Collects candidate ids, then fetches and forwards matching executions
/// chunk by chunk.
#[expect(clippy::too_many_arguments, reason = "mirrors the public query shape each stream wires through")]
async fn run_stream(
    router: Arc<BackendRouter>,
    config: Arc<RedisRepositoryConfig>,
    execution_type: ExecutionType,
    index_key: String,
    kind: IndexKind,
    pool_size: usize,
    criteria: QueryCriteria,
    tx: mpsc::Sender<Result<Execution, RepositoryError>>,
) -> Result<(), RepositoryError> {
    let mut seen = HashSet::new();
    let mut ordered_ids = Vec::new();
    for (label, conn) in router.all() {
        for id in read_index_members(conn, &index_key, kind).await.map_err(RepositoryError::from)? {
            if seen.insert(id.clone()) {
                ordered_ids.push((id, label));
            }
        }
    }

    let mut matched = 0usize;
    for chunk in ordered_ids.chunks(config.chunk_size.max(1)) {
        let semaphore = Arc::new(Semaphore::new(pool_size.max(1)));
        let mut tasks = Vec::with_capacity(chunk.len());
        for (raw_id, source) in chunk {
            let id = ExecutionId::new(raw_id.clone());
            let source = *source;
            let router = Arc::clone(&router);
            let semaphore = Arc::clone(&semaphore);
            let index_key = index_key.clone();
            tasks.push(tokio::spawn(async move {
                #[expect(clippy::unwrap_used, reason = "semaphore is never closed while this task runs")]
                let _permit = semaphore.acquire().await.unwrap();
                let outcome = reader::retrieve(&router, execution_type, &id).await;
                if let Err(RepositoryError::NotFound(_)) = &outcome
                    && let Some(conn) = backend_connection(&router, source)
                {
                    heal_index(conn, &index_key, kind, id.as_str()).await;
                }
                outcome
            }));
        }
        for task in tasks {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(error) => Err(RepositoryError::BackendError(format!("query task panicked: {error}"))),
            };
            match outcome {
                Ok(execution) if criteria.matches_status(execution.status) => {
                    matched += 1;
                    if tx.send(Ok(execution)).await.is_err() {
                        return Ok(());
                    }
                    if let Some(limit) = criteria.limit
                        && matched >= limit
                    {
                        return Ok(());
                    }
                }
                // A decoded-but-filtered-out match and a healed stale index
                // entry both mean "nothing to emit for this id".
                Ok(_) | Err(RepositoryError::NotFound(_)) => {}
                Err(error) => {
                    let _ = tx.send(Err(error)).await;
                }
            }
        }
    }
    Ok(())
}
