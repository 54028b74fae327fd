// crates/execution-repo-redis/tests/redis_repository.rs
// ============================================================================
// Module: Redis Repository Integration Tests
// Description: Exercises RedisExecutionRepository against a live Redis
//              server for the scenarios and testable properties in §8.
// Purpose: Validate round-trip, stage-index agreement, synthetic insertion
//          order, context-merge idempotence, cancel monotonicity, and
//          index self-healing end to end.
// ============================================================================

//! Requires a reachable Redis server at `REDIS_TEST_URL` (e.g.
//! `redis://127.0.0.1:6379/`). Ignored by default so `cargo test` stays
//! green with no external services; run with
//! `REDIS_TEST_URL=redis://... cargo test -- --ignored` to exercise them.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only setup and panic-based assertions are permitted."
)]

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use execution_repo_core::CorrelationId;
use execution_repo_core::Execution;
use execution_repo_core::ExecutionId;
use execution_repo_core::ExecutionRepository;
use execution_repo_core::ExecutionStatus;
use execution_repo_core::ExecutionType;
use execution_repo_core::PipelineConfigId;
use execution_repo_core::Stage;
use execution_repo_core::StageId;
use execution_repo_core::SyntheticStageOwner;
use execution_repo_redis::RedisExecutionRepository;
use execution_repo_redis::RedisRepositoryConfig;
use redis::AsyncCommands;
use tokio_stream::StreamExt;

static UNIQUE: AtomicU64 = AtomicU64::new(0);

/// Returns a unique id scoped to this test process, avoiding cross-test
/// collisions within the same shared Redis instance.
fn unique_id(prefix: &str) -> String {
    let n = UNIQUE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{n}", std::process::id())
}

/// Connects to the Redis server named by `REDIS_TEST_URL`, or panics with a
/// clear message explaining how to provide one.
async fn connect() -> RedisExecutionRepository {
    let url = std::env::var("REDIS_TEST_URL")
        .expect("set REDIS_TEST_URL to a reachable Redis server to run these tests");
    RedisExecutionRepository::connect(RedisRepositoryConfig::new(url)).await.expect("connect to Redis")
}

fn pipeline_with_stages(id: &str, application: &str, config_id: &str, stage_ids: &[&str]) -> Execution {
    let mut execution = Execution::new_pipeline(id, application);
    execution.pipeline.as_mut().expect("pipeline fields").pipeline_config_id = Some(PipelineConfigId::new(config_id));
    for stage_id in stage_ids {
        execution.stages.push(Stage::new(*stage_id, format!("ref-{stage_id}"), "wait"));
    }
    execution
}

#[tokio::test]
#[ignore = "requires a live Redis server, see REDIS_TEST_URL"]
async fn s1_store_and_retrieve_pipeline() {
    let repo = connect().await;
    let id = unique_id("p");
    let config_id = unique_id("cfg");
    let mut execution = pipeline_with_stages(&id, "demo", &config_id, &["s1"]);
    execution.stages[0].status = ExecutionStatus::NotStarted;

    repo.store_execution(&execution).await.expect("store");
    let loaded = repo.retrieve(ExecutionType::Pipeline, &ExecutionId::new(&id)).await.expect("retrieve");
    assert_eq!(loaded.stages.len(), 1);
    assert_eq!(loaded.stages[0].id, StageId::new("s1"));

    let mut members: Vec<Execution> = Vec::new();
    let mut stream = repo.retrieve_pipelines_for_pipeline_config_id(
        &PipelineConfigId::new(&config_id),
        execution_repo_core::QueryCriteria::unbounded(),
    );
    while let Some(item) = stream.next().await {
        members.push(item.expect("decode"));
    }
    assert!(members.iter().any(|execution| execution.id == ExecutionId::new(&id)));
}

#[tokio::test]
#[ignore = "requires a live Redis server, see REDIS_TEST_URL"]
async fn s2_pause_from_not_started_fails() {
    let repo = connect().await;
    let id = unique_id("o");
    let execution = Execution::new_orchestration(id.as_str(), "demo");
    repo.store_execution(&execution).await.expect("store");

    let result = repo.pause(ExecutionType::Orchestration, &ExecutionId::new(&id), Some("alice".to_string())).await;
    assert!(matches!(result, Err(execution_repo_core::RepositoryError::InvalidState(_))));

    let loaded = repo.retrieve(ExecutionType::Orchestration, &ExecutionId::new(&id)).await.expect("retrieve");
    assert_eq!(loaded.status, ExecutionStatus::NotStarted);
}

#[tokio::test]
#[ignore = "requires a live Redis server, see REDIS_TEST_URL"]
async fn s3_cancel_not_started_transitions_to_canceled() {
    let repo = connect().await;
    let id = unique_id("o");
    let execution = Execution::new_orchestration(id.as_str(), "demo");
    repo.store_execution(&execution).await.expect("store");

    repo.cancel(ExecutionType::Orchestration, &ExecutionId::new(&id), None, None).await.expect("cancel");

    let loaded = repo.retrieve(ExecutionType::Orchestration, &ExecutionId::new(&id)).await.expect("retrieve");
    assert_eq!(loaded.status, ExecutionStatus::Canceled);
    assert!(loaded.canceled);
}

#[tokio::test]
#[ignore = "requires a live Redis server, see REDIS_TEST_URL"]
async fn s3b_cancel_running_leaves_status_unchanged() {
    let repo = connect().await;
    let id = unique_id("o");
    let mut execution = Execution::new_orchestration(id.as_str(), "demo");
    execution.status = ExecutionStatus::Running;
    repo.store_execution(&execution).await.expect("store");

    repo.cancel(ExecutionType::Orchestration, &ExecutionId::new(&id), Some("bob".to_string()), Some("stop".to_string()))
        .await
        .expect("cancel");

    let loaded = repo.retrieve(ExecutionType::Orchestration, &ExecutionId::new(&id)).await.expect("retrieve");
    assert_eq!(loaded.status, ExecutionStatus::Running);
    assert!(loaded.canceled);
    assert_eq!(loaded.canceled_by.as_deref(), Some("bob"));
}

#[tokio::test]
#[ignore = "requires a live Redis server, see REDIS_TEST_URL"]
async fn s4_add_stage_before_splices_at_parent_position() {
    let repo = connect().await;
    let id = unique_id("p");
    let execution = pipeline_with_stages(&id, "demo", "---", &["a", "b", "c"]);
    repo.store_execution(&execution).await.expect("store");

    let mut child = Stage::new("x", "ref-x", "synthetic");
    child.synthetic_stage_owner = SyntheticStageOwner::StageBefore;
    child.parent_stage_id = Some(StageId::new("b"));
    repo.add_stage(&ExecutionId::new(&id), child).await.expect("add stage");

    let loaded = repo.retrieve(ExecutionType::Pipeline, &ExecutionId::new(&id)).await.expect("retrieve");
    let order: Vec<&str> = loaded.stages.iter().map(|stage| stage.id.as_str()).collect();
    assert_eq!(order, vec!["a", "x", "b", "c"]);
}

#[tokio::test]
#[ignore = "requires a live Redis server, see REDIS_TEST_URL"]
async fn s4b_add_stage_after_splices_after_parent_position() {
    let repo = connect().await;
    let id = unique_id("p");
    let execution = pipeline_with_stages(&id, "demo", "---", &["a", "b", "c"]);
    repo.store_execution(&execution).await.expect("store");

    let mut child = Stage::new("x", "ref-x", "synthetic");
    child.synthetic_stage_owner = SyntheticStageOwner::StageAfter;
    child.parent_stage_id = Some(StageId::new("b"));
    repo.add_stage(&ExecutionId::new(&id), child).await.expect("add stage");

    let loaded = repo.retrieve(ExecutionType::Pipeline, &ExecutionId::new(&id)).await.expect("retrieve");
    let order: Vec<&str> = loaded.stages.iter().map(|stage| stage.id.as_str()).collect();
    assert_eq!(order, vec!["a", "b", "x", "c"]);
}

#[tokio::test]
#[ignore = "requires a live Redis server, see REDIS_TEST_URL"]
async fn add_stage_rejects_non_synthetic() {
    let repo = connect().await;
    let id = unique_id("p");
    let execution = pipeline_with_stages(&id, "demo", "---", &["a"]);
    repo.store_execution(&execution).await.expect("store");

    let authored = Stage::new("x", "ref-x", "wait");
    let result = repo.add_stage(&ExecutionId::new(&id), authored).await;
    assert!(matches!(result, Err(execution_repo_core::RepositoryError::InvalidArgument(_))));
}

#[tokio::test]
#[ignore = "requires a live Redis server, see REDIS_TEST_URL"]
async fn stage_index_agrees_with_ordered_list_after_remove() {
    let repo = connect().await;
    let id = unique_id("p");
    let execution = pipeline_with_stages(&id, "demo", "---", &["a", "b", "c"]);
    repo.store_execution(&execution).await.expect("store");

    repo.remove_stage(&ExecutionId::new(&id), &StageId::new("b")).await.expect("remove");

    let url = std::env::var("REDIS_TEST_URL").expect("REDIS_TEST_URL");
    let client = redis::Client::open(url).expect("client");
    let mut conn = client.get_multiplexed_async_connection().await.expect("connect");
    let stage_index: String = conn.hget(format!("pipeline:{id}"), "stageIndex").await.expect("hget");
    let order_key = format!("pipeline:{id}:stageIndex");
    let ordered: Vec<String> = conn.lrange(&order_key, 0, -1).await.expect("lrange");
    assert_eq!(stage_index, ordered.join(","));
    assert_eq!(ordered, vec!["a", "c"]);
}

#[tokio::test]
#[ignore = "requires a live Redis server, see REDIS_TEST_URL"]
async fn context_merge_is_idempotent() {
    let repo = connect().await;
    let id = unique_id("o");
    let mut execution = Execution::new_orchestration(id.as_str(), "demo");
    execution.trigger.correlation_id = Some(CorrelationId::new(unique_id("corr")));
    repo.store_execution(&execution).await.expect("store");

    let mut ctx = serde_json::Map::new();
    ctx.insert("k".to_string(), serde_json::json!("v"));

    repo.store_execution_context(ExecutionType::Orchestration, &ExecutionId::new(&id), ctx.clone())
        .await
        .expect("store context once");
    let once = repo.retrieve(ExecutionType::Orchestration, &ExecutionId::new(&id)).await.expect("retrieve");

    repo.store_execution_context(ExecutionType::Orchestration, &ExecutionId::new(&id), ctx)
        .await
        .expect("store context twice");
    let twice = repo.retrieve(ExecutionType::Orchestration, &ExecutionId::new(&id)).await.expect("retrieve");

    assert_eq!(once.trigger.fields, twice.trigger.fields);
}

#[tokio::test]
#[ignore = "requires a live Redis server, see REDIS_TEST_URL"]
async fn s5_orphan_index_entry_self_heals_during_stream() {
    let repo = connect().await;
    let ghost = unique_id("ghost");
    let url = std::env::var("REDIS_TEST_URL").expect("REDIS_TEST_URL");
    let client = redis::Client::open(url).expect("client");
    let mut conn = client.get_multiplexed_async_connection().await.expect("connect");
    let _: i64 = conn.sadd("allJobs:orchestration", &ghost).await.expect("inject ghost");

    let mut stream = repo.retrieve_for_type(ExecutionType::Orchestration, execution_repo_core::QueryCriteria::unbounded());
    while let Some(item) = stream.next().await {
        if let Ok(execution) = item {
            assert_ne!(execution.id, ExecutionId::new(&ghost));
        }
    }

    let still_present: bool = conn.sismember("allJobs:orchestration", &ghost).await.expect("sismember");
    assert!(!still_present, "stream should have healed the stale index entry");
}

#[tokio::test]
#[ignore = "requires a live Redis server, see REDIS_TEST_URL"]
async fn s6_correlation_lookup_completes_then_fails() {
    let repo = connect().await;
    let id = unique_id("o");
    let correlation_id = CorrelationId::new(unique_id("corr"));
    let mut execution = Execution::new_orchestration(id.as_str(), "demo");
    execution.status = ExecutionStatus::Running;
    execution.trigger.correlation_id = Some(correlation_id.clone());
    repo.store_execution(&execution).await.expect("store");

    let found = repo.retrieve_orchestration_for_correlation_id(&correlation_id).await.expect("lookup");
    assert_eq!(found.id, ExecutionId::new(&id));

    repo.update_status(ExecutionType::Orchestration, &ExecutionId::new(&id), ExecutionStatus::Succeeded)
        .await
        .expect("update status");

    let result = repo.retrieve_orchestration_for_correlation_id(&correlation_id).await;
    assert!(matches!(result, Err(execution_repo_core::RepositoryError::NotFound(_))));
}

#[tokio::test]
#[ignore = "requires a live Redis server, see REDIS_TEST_URL"]
async fn delete_removes_index_entries_and_hash() {
    let repo = connect().await;
    let id = unique_id("o");
    let execution = Execution::new_orchestration(id.as_str(), "demo");
    repo.store_execution(&execution).await.expect("store");

    repo.delete(ExecutionType::Orchestration, &ExecutionId::new(&id)).await.expect("delete");

    let result = repo.retrieve(ExecutionType::Orchestration, &ExecutionId::new(&id)).await;
    assert!(matches!(result, Err(execution_repo_core::RepositoryError::NotFound(_))));

    let delete_again = repo.delete(ExecutionType::Orchestration, &ExecutionId::new(&id)).await;
    assert!(delete_again.is_ok(), "deleting a missing execution is not an error");
}

#[tokio::test]
#[ignore = "requires a live Redis server, see REDIS_TEST_URL"]
async fn cross_backend_primary_wins_on_conflict() {
    let url = std::env::var("REDIS_TEST_URL").expect("REDIS_TEST_URL");
    let config = RedisRepositoryConfig { previous_url: Some(url.clone()), ..RedisRepositoryConfig::new(url) };
    let repo = RedisExecutionRepository::connect(config).await.expect("connect");

    let id = unique_id("o");
    let mut primary_version = Execution::new_orchestration(id.as_str(), "demo");
    primary_version.status = ExecutionStatus::Running;
    repo.store_execution(&primary_version).await.expect("store");

    let loaded = repo.retrieve(ExecutionType::Orchestration, &ExecutionId::new(&id)).await.expect("retrieve");
    assert_eq!(loaded.status, ExecutionStatus::Running);
}
