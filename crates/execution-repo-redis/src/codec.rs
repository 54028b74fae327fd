// crates/execution-repo-redis/src/codec.rs
// ============================================================================
// Module: Execution Aggregate Codec
// Description: Encodes/decodes the Execution aggregate to/from a flat,
//              field-addressed Redis hash.
// Purpose: Implement the field-namespacing scheme described in §4.2.
// Dependencies: execution_repo_core, serde_json
// ============================================================================

//! ## Overview
//! An execution is stored as one Redis hash keyed by `<type>:<id>`.
//! Execution-level fields are flat (`status`, `buildTime`, ...); stage
//! fields are namespaced `stage.<stageId>.<field>` so that a single stage
//! can be rewritten with `HSET`/`HDEL` without touching its siblings
//! (§4.2, §4.3). The ordered list of stage ids is the aggregate's
//! authoritative child order (§3 invariant 2) and is held in a companion
//! Redis list; the hash also carries a denormalized, comma-joined copy
//! under `stageIndex` for single-round-trip reads. The two are allowed to
//! disagree for the instant between the list write and the hash write of
//! `addStage`/`removeStage` (§9 Open Question).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::collections::HashMap;

use execution_repo_core::ApplicationId;
use execution_repo_core::CorrelationId;
use execution_repo_core::Execution;
use execution_repo_core::ExecutionId;
use execution_repo_core::ExecutionStatus;
use execution_repo_core::ExecutionType;
use execution_repo_core::OrchestrationFields;
use execution_repo_core::PipelineConfigId;
use execution_repo_core::PipelineFields;
use execution_repo_core::Stage;
use execution_repo_core::StageId;
use execution_repo_core::StageRefId;
use execution_repo_core::SyntheticStageOwner;
use execution_repo_core::Task;
use execution_repo_core::Trigger;
use serde::Deserialize;
use serde::Serialize;

use crate::error::RedisBackendError;

/// Prefix marking a stage-namespaced field (`stage.<id>.<suffix>`).
const STAGE_FIELD_PREFIX: &str = "stage.";

/// Suffixes making up a single stage's field set, enumerated deterministically
/// so `removeStage` can `HDEL` an exact, known set of fields (§9 Open
/// Question).
const STAGE_FIELD_SUFFIXES: &[&str] = &[
    "refId",
    "type",
    "name",
    "startTime",
    "endTime",
    "status",
    "syntheticStageOwner",
    "parentStageId",
    "requisiteStageRefIds",
    "scheduledTime",
    "context",
    "outputs",
    "tasks",
    "lastModified",
];

/// Returns the namespaced hash field name for a stage's `suffix` (§4.2).
#[must_use]
pub fn stage_field(stage_id: &StageId, suffix: &str) -> String {
    format!("{STAGE_FIELD_PREFIX}{}.{suffix}", stage_id.as_str())
}

/// Returns every namespaced field name belonging to `stage_id`, for use in
/// `HDEL` (§4.3 `removeStage`).
#[must_use]
pub fn stage_field_names(stage_id: &StageId) -> Vec<String> {
    STAGE_FIELD_SUFFIXES.iter().map(|suffix| stage_field(stage_id, suffix)).collect()
}

/// Serializes an ordered stage-id list into the denormalized `stageIndex`
/// field value.
#[must_use]
pub fn encode_stage_index(stage_ids: &[StageId]) -> String {
    stage_ids.iter().map(StageId::as_str).collect::<Vec<_>>().join(",")
}

/// Parses the denormalized `stageIndex` field value back into stage ids.
#[must_use]
pub fn decode_stage_index(raw: &str) -> Vec<StageId> {
    if raw.is_empty() {
        Vec::new()
    } else {
        raw.split(',').map(StageId::new).collect()
    }
}

/// Serializes a JSON-capable value into its hash field string form.
fn encode_json<T: Serialize>(value: &T) -> Result<String, RedisBackendError> {
    serde_json::to_string(value).map_err(|error| RedisBackendError::Decode(error.to_string()))
}

/// Deserializes a hash field string back into a JSON-capable value.
fn decode_json<T: for<'de> Deserialize<'de>>(raw: &str) -> Result<T, RedisBackendError> {
    serde_json::from_str(raw).map_err(|error| RedisBackendError::Decode(error.to_string()))
}

/// Encodes a single stage's namespaced fields into `(field, value)` pairs
/// suitable for `HSET` (§4.3 `storeStage`).
///
/// # Errors
/// Returns [`RedisBackendError::Decode`] if `context`, `outputs`, `tasks`,
/// or `last_modified` fail to serialize.
pub fn encode_stage_fields(stage: &Stage) -> Result<Vec<(String, String)>, RedisBackendError> {
    let mut fields = Vec::with_capacity(STAGE_FIELD_SUFFIXES.len());
    fields.push((stage_field(&stage.id, "refId"), stage.ref_id.as_str().to_string()));
    fields.push((stage_field(&stage.id, "type"), stage.stage_type.clone()));
    if let Some(name) = &stage.name {
        fields.push((stage_field(&stage.id, "name"), name.clone()));
    }
    if let Some(start_time) = stage.start_time {
        fields.push((stage_field(&stage.id, "startTime"), start_time.as_millis().to_string()));
    }
    if let Some(end_time) = stage.end_time {
        fields.push((stage_field(&stage.id, "endTime"), end_time.as_millis().to_string()));
    }
    fields.push((stage_field(&stage.id, "status"), status_to_str(stage.status).to_string()));
    fields.push((
        stage_field(&stage.id, "syntheticStageOwner"),
        synthetic_owner_to_str(stage.synthetic_stage_owner).to_string(),
    ));
    if let Some(parent) = &stage.parent_stage_id {
        fields.push((stage_field(&stage.id, "parentStageId"), parent.as_str().to_string()));
    }
    fields.push((
        stage_field(&stage.id, "requisiteStageRefIds"),
        stage.requisite_stage_ref_ids.iter().map(StageRefId::as_str).collect::<Vec<_>>().join(","),
    ));
    if let Some(scheduled_time) = stage.scheduled_time {
        fields.push((stage_field(&stage.id, "scheduledTime"), scheduled_time.as_millis().to_string()));
    }
    fields.push((stage_field(&stage.id, "context"), encode_json(&stage.context)?));
    fields.push((stage_field(&stage.id, "outputs"), encode_json(&stage.outputs)?));
    fields.push((stage_field(&stage.id, "tasks"), encode_json(&stage.tasks)?));
    fields.push((stage_field(&stage.id, "lastModified"), encode_json(&stage.last_modified)?));
    Ok(fields)
}

/// Decodes one stage's namespaced fields back into a [`Stage`] (§4.4
/// `retrieve`).
///
/// # Errors
/// Returns [`RedisBackendError::Decode`] if a required field is missing or
/// malformed.
#[expect(clippy::implicit_hasher, reason = "always called with the hasher Redis replies deserialize into")]
pub fn decode_stage(stage_id: &StageId, fields: &HashMap<String, String>) -> Result<Stage, RedisBackendError> {
    let get = |suffix: &str| fields.get(&stage_field(stage_id, suffix));
    let ref_id = get("refId").ok_or_else(|| RedisBackendError::Decode(format!("stage {stage_id} missing refId")))?;
    let stage_type =
        get("type").ok_or_else(|| RedisBackendError::Decode(format!("stage {stage_id} missing type")))?;
    let status = get("status")
        .map(|raw| status_from_str(raw))
        .transpose()?
        .ok_or_else(|| RedisBackendError::Decode(format!("stage {stage_id} missing status")))?;
    let synthetic_stage_owner = get("syntheticStageOwner")
        .map(|raw| synthetic_owner_from_str(raw))
        .transpose()?
        .unwrap_or(SyntheticStageOwner::Unset);
    let requisite_stage_ref_ids: BTreeSet<StageRefId> = get("requisiteStageRefIds")
        .map(String::as_str)
        .unwrap_or_default()
        .split(',')
        .filter(|part| !part.is_empty())
        .map(StageRefId::new)
        .collect();

    Ok(Stage {
        id: stage_id.clone(),
        ref_id: StageRefId::new(ref_id.clone()),
        stage_type: stage_type.clone(),
        name: get("name").cloned(),
        start_time: get("startTime").map(|raw| parse_millis(raw)).transpose()?,
        end_time: get("endTime").map(|raw| parse_millis(raw)).transpose()?,
        status,
        synthetic_stage_owner,
        parent_stage_id: get("parentStageId").map(|raw| StageId::new(raw.clone())),
        requisite_stage_ref_ids,
        scheduled_time: get("scheduledTime").map(|raw| parse_millis(raw)).transpose()?,
        context: get("context").map(|raw| decode_json(raw)).transpose()?.unwrap_or_default(),
        outputs: get("outputs").map(|raw| decode_json(raw)).transpose()?.unwrap_or_default(),
        tasks: get("tasks").map(|raw| decode_json::<Vec<Task>>(raw)).transpose()?.unwrap_or_default(),
        last_modified: get("lastModified").map(|raw| decode_json(raw)).transpose()?.unwrap_or_default(),
        execution_id: None,
    })
}

/// Parses a millisecond timestamp field.
fn parse_millis(raw: &str) -> Result<execution_repo_core::core::time::Timestamp, RedisBackendError> {
    raw.parse::<i64>()
        .map(execution_repo_core::core::time::Timestamp::from_millis)
        .map_err(|error| RedisBackendError::Decode(error.to_string()))
}

/// Renders an [`ExecutionStatus`] to its wire string.
#[must_use]
pub const fn status_to_str(status: ExecutionStatus) -> &'static str {
    match status {
        ExecutionStatus::NotStarted => "NOT_STARTED",
        ExecutionStatus::Running => "RUNNING",
        ExecutionStatus::Paused => "PAUSED",
        ExecutionStatus::Succeeded => "SUCCEEDED",
        ExecutionStatus::Canceled => "CANCELED",
        ExecutionStatus::Stopped => "STOPPED",
        ExecutionStatus::Terminal => "TERMINAL",
        ExecutionStatus::FailedContinue => "FAILED_CONTINUE",
        ExecutionStatus::Failed => "FAILED",
        ExecutionStatus::Skipped => "SKIPPED",
        ExecutionStatus::Buffered => "BUFFERED",
        ExecutionStatus::Redirect => "REDIRECT",
    }
}

/// Parses an [`ExecutionStatus`] from its wire string.
///
/// # Errors
/// Returns [`RedisBackendError::Decode`] if `raw` is not a known status.
pub fn status_from_str(raw: &str) -> Result<ExecutionStatus, RedisBackendError> {
    match raw {
        "NOT_STARTED" => Ok(ExecutionStatus::NotStarted),
        "RUNNING" => Ok(ExecutionStatus::Running),
        "PAUSED" => Ok(ExecutionStatus::Paused),
        "SUCCEEDED" => Ok(ExecutionStatus::Succeeded),
        "CANCELED" => Ok(ExecutionStatus::Canceled),
        "STOPPED" => Ok(ExecutionStatus::Stopped),
        "TERMINAL" => Ok(ExecutionStatus::Terminal),
        "FAILED_CONTINUE" => Ok(ExecutionStatus::FailedContinue),
        "FAILED" => Ok(ExecutionStatus::Failed),
        "SKIPPED" => Ok(ExecutionStatus::Skipped),
        "BUFFERED" => Ok(ExecutionStatus::Buffered),
        "REDIRECT" => Ok(ExecutionStatus::Redirect),
        other => Err(RedisBackendError::Decode(format!("unknown execution status: {other}"))),
    }
}

/// Renders a [`SyntheticStageOwner`] to its wire string.
#[must_use]
pub const fn synthetic_owner_to_str(owner: SyntheticStageOwner) -> &'static str {
    match owner {
        SyntheticStageOwner::Unset => "UNSET",
        SyntheticStageOwner::StageBefore => "STAGE_BEFORE",
        SyntheticStageOwner::StageAfter => "STAGE_AFTER",
    }
}

/// Parses a [`SyntheticStageOwner`] from its wire string.
///
/// # Errors
/// Returns [`RedisBackendError::Decode`] if `raw` is not a known owner tag.
pub fn synthetic_owner_from_str(raw: &str) -> Result<SyntheticStageOwner, RedisBackendError> {
    match raw {
        "UNSET" => Ok(SyntheticStageOwner::Unset),
        "STAGE_BEFORE" => Ok(SyntheticStageOwner::StageBefore),
        "STAGE_AFTER" => Ok(SyntheticStageOwner::StageAfter),
        other => Err(RedisBackendError::Decode(format!("unknown synthetic stage owner: {other}"))),
    }
}

/// Execution-level field names, excluding the `stage.*` namespace and
/// `stageIndex`.
const EXECUTION_FIELD_ENGINE: &str = "executionEngine";

/// Encodes an execution's flat, non-stage fields into `(field, value)`
/// pairs suitable for `HSET` (§4.3 `storeExecution`).
///
/// # Errors
/// Returns [`RedisBackendError::Decode`] if a JSON-valued field fails to
/// serialize.
pub fn encode_execution_fields(execution: &Execution) -> Result<Vec<(String, String)>, RedisBackendError> {
    let mut fields = vec![
        ("id".to_string(), execution.id.as_str().to_string()),
        ("application".to_string(), execution.application.as_str().to_string()),
        ("status".to_string(), status_to_str(execution.status).to_string()),
        ("buildTime".to_string(), execution.build_time.as_millis().to_string()),
        ("canceled".to_string(), execution.canceled.to_string()),
        ("limitConcurrent".to_string(), execution.limit_concurrent.to_string()),
        ("keepWaitingPipelines".to_string(), execution.keep_waiting_pipelines.to_string()),
        (EXECUTION_FIELD_ENGINE.to_string(), execution.execution_engine.clone()),
        ("trigger".to_string(), encode_json(&execution.trigger)?),
        ("stageIndex".to_string(), encode_stage_index(&execution.stages.iter().map(|s| s.id.clone()).collect::<Vec<_>>())),
    ];
    if let Some(start_time) = execution.start_time {
        fields.push(("startTime".to_string(), start_time.as_millis().to_string()));
    }
    if let Some(end_time) = execution.end_time {
        fields.push(("endTime".to_string(), end_time.as_millis().to_string()));
    }
    if let Some(canceled_by) = &execution.canceled_by {
        fields.push(("canceledBy".to_string(), canceled_by.clone()));
    }
    if let Some(reason) = &execution.cancellation_reason {
        fields.push(("cancellationReason".to_string(), reason.clone()));
    }
    if let Some(authentication) = &execution.authentication {
        fields.push(("authentication".to_string(), encode_json(authentication)?));
    }
    if let Some(paused) = &execution.paused {
        fields.push(("paused".to_string(), encode_json(paused)?));
    }
    if let Some(origin) = &execution.origin {
        fields.push(("origin".to_string(), origin.clone()));
    }
    match (execution.execution_type, &execution.pipeline, &execution.orchestration) {
        (ExecutionType::Pipeline, Some(pipeline), _) => {
            if let Some(name) = &pipeline.name {
                fields.push(("name".to_string(), name.clone()));
            }
            if let Some(pipeline_config_id) = &pipeline.pipeline_config_id {
                fields.push(("pipelineConfigId".to_string(), pipeline_config_id.as_str().to_string()));
            }
            fields.push(("notifications".to_string(), encode_json(&pipeline.notifications)?));
            fields.push(("initialConfig".to_string(), encode_json(&pipeline.initial_config)?));
        }
        (ExecutionType::Orchestration, _, Some(orchestration)) => {
            if let Some(description) = &orchestration.description {
                fields.push(("description".to_string(), description.clone()));
            }
        }
        _ => {}
    }
    Ok(fields)
}

/// Decodes a full execution hash (flat fields plus every `stage.*`
/// namespace) into an [`Execution`] (§4.2, §4.4 `retrieve`).
///
/// `ordered_stage_ids` is the authoritative ordered stage-id list read from
/// the execution's list key; it is the primary source of stage order. When
/// it is empty (legacy records written before the list existed), the
/// denormalized comma-joined `stageIndex` hash field is used instead (§4.4,
/// §9 Open Question).
///
/// # Errors
/// Returns [`RedisBackendError::Decode`] if a required field is missing or
/// malformed.
#[expect(clippy::implicit_hasher, reason = "always called with the hasher Redis replies deserialize into")]
pub fn decode_execution(
    execution_type: ExecutionType,
    id: &ExecutionId,
    fields: &HashMap<String, String>,
    ordered_stage_ids: &[StageId],
) -> Result<Execution, RedisBackendError> {
    let get = |name: &str| fields.get(name);
    let application = get("application")
        .ok_or_else(|| RedisBackendError::Decode(format!("execution {id} missing application")))?;
    let status = get("status")
        .map(|raw| status_from_str(raw))
        .transpose()?
        .ok_or_else(|| RedisBackendError::Decode(format!("execution {id} missing status")))?;
    let build_time = get("buildTime")
        .map(|raw| parse_millis(raw))
        .transpose()?
        .ok_or_else(|| RedisBackendError::Decode(format!("execution {id} missing buildTime")))?;
    let trigger: Trigger =
        get("trigger").map(|raw| decode_json(raw)).transpose()?.unwrap_or_default();

    let stage_ids: Vec<StageId> = if ordered_stage_ids.is_empty() {
        decode_stage_index(get("stageIndex").map(String::as_str).unwrap_or_default())
    } else {
        ordered_stage_ids.to_vec()
    };
    let mut stages = Vec::with_capacity(stage_ids.len());
    for stage_id in &stage_ids {
        stages.push(decode_stage(stage_id, fields)?);
    }

    let pipeline = match execution_type {
        ExecutionType::Pipeline => Some(PipelineFields {
            name: get("name").cloned(),
            pipeline_config_id: get("pipelineConfigId").map(|raw| PipelineConfigId::new(raw.clone())),
            notifications: get("notifications").map(|raw| decode_json(raw)).transpose()?.unwrap_or_default(),
            initial_config: get("initialConfig").map(|raw| decode_json(raw)).transpose()?.unwrap_or_default(),
        }),
        ExecutionType::Orchestration => None,
    };
    let orchestration = match execution_type {
        ExecutionType::Orchestration => Some(OrchestrationFields {
            description: get("description").cloned(),
        }),
        ExecutionType::Pipeline => None,
    };

    let mut execution = Execution {
        id: id.clone(),
        execution_type,
        application: ApplicationId::new(application.clone()),
        status,
        build_time,
        start_time: get("startTime").map(|raw| parse_millis(raw)).transpose()?,
        end_time: get("endTime").map(|raw| parse_millis(raw)).transpose()?,
        canceled: get("canceled").is_some_and(|raw| raw == "true"),
        canceled_by: get("canceledBy").cloned(),
        cancellation_reason: get("cancellationReason").cloned(),
        limit_concurrent: get("limitConcurrent").is_some_and(|raw| raw == "true"),
        keep_waiting_pipelines: get("keepWaitingPipelines").is_some_and(|raw| raw == "true"),
        authentication: get("authentication").map(|raw| decode_json(raw)).transpose()?,
        paused: get("paused").map(|raw| decode_json(raw)).transpose()?,
        execution_engine: get(EXECUTION_FIELD_ENGINE)
            .cloned()
            .unwrap_or_else(|| execution_repo_core::DEFAULT_EXECUTION_ENGINE.to_string()),
        origin: get("origin").cloned(),
        trigger,
        stages,
        pipeline,
        orchestration,
    };
    execution.reparent_stages();
    Ok(execution)
}

/// Returns the correlation id embedded in a trigger, if any.
#[must_use]
pub const fn trigger_correlation_id(trigger: &Trigger) -> Option<&CorrelationId> {
    trigger.correlation_id.as_ref()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, reason = "Unit tests use expect/unwrap for setup clarity.")]

    use execution_repo_core::core::time::Timestamp;
    use proptest::prelude::*;

    use super::*;

    fn sample_stage(id: &str) -> Stage {
        let mut stage = Stage::new(id, format!("ref-{id}"), "wait");
        stage.name = Some("wait a bit".to_string());
        stage.start_time = Some(Timestamp::from_millis(1_000));
        stage.status = ExecutionStatus::Running;
        stage.requisite_stage_ref_ids = BTreeSet::from([StageRefId::new("ref-a")]);
        stage.context.insert("k".to_string(), serde_json::json!("v"));
        stage.outputs.insert("out".to_string(), serde_json::json!(1));
        stage.tasks.push(Task(serde_json::json!({"id": "t1"})));
        stage
    }

    #[test]
    fn stage_field_names_enumerates_every_known_suffix() {
        let id = StageId::new("s1");
        let names = stage_field_names(&id);
        assert_eq!(names.len(), STAGE_FIELD_SUFFIXES.len());
        assert!(names.contains(&"stage.s1.refId".to_string()));
        assert!(names.contains(&"stage.s1.lastModified".to_string()));
    }

    #[test]
    fn stage_index_encode_decode_roundtrip() {
        let ids = vec![StageId::new("a"), StageId::new("b"), StageId::new("c")];
        let encoded = encode_stage_index(&ids);
        assert_eq!(encoded, "a,b,c");
        assert_eq!(decode_stage_index(&encoded), ids);
    }

    #[test]
    fn empty_stage_index_decodes_to_empty_list() {
        assert!(decode_stage_index("").is_empty());
    }

    #[test]
    fn stage_fields_roundtrip_through_encode_decode() {
        let stage = sample_stage("s1");
        let fields = encode_stage_fields(&stage).expect("encode");
        let map: HashMap<String, String> = fields.into_iter().collect();
        let decoded = decode_stage(&stage.id, &map).expect("decode");
        assert_eq!(decoded.ref_id, stage.ref_id);
        assert_eq!(decoded.stage_type, stage.stage_type);
        assert_eq!(decoded.name, stage.name);
        assert_eq!(decoded.start_time, stage.start_time);
        assert_eq!(decoded.status, stage.status);
        assert_eq!(decoded.requisite_stage_ref_ids, stage.requisite_stage_ref_ids);
        assert_eq!(decoded.context, stage.context);
        assert_eq!(decoded.outputs, stage.outputs);
        assert_eq!(decoded.tasks, stage.tasks);
    }

    #[test]
    fn absent_optional_stage_fields_are_never_emitted() {
        let stage = Stage::new("s1", "ref1", "wait");
        let fields = encode_stage_fields(&stage).expect("encode");
        for (_, value) in &fields {
            assert_ne!(value, "null");
        }
        let names: Vec<&str> = fields.iter().map(|(name, _)| name.as_str()).collect();
        assert!(!names.contains(&"stage.s1.name"));
        assert!(!names.contains(&"stage.s1.startTime"));
        assert!(!names.contains(&"stage.s1.parentStageId"));
    }

    #[test]
    fn execution_fields_roundtrip_for_pipeline() {
        let mut execution = Execution::new_pipeline("p1", "demo");
        execution.stages.push(sample_stage("s1"));
        execution.stages.push(sample_stage("s2"));
        execution.pipeline.as_mut().expect("pipeline fields").pipeline_config_id =
            Some(PipelineConfigId::new("cfg"));

        let mut fields: HashMap<String, String> = encode_execution_fields(&execution).expect("encode").into_iter().collect();
        for stage in &execution.stages {
            fields.extend(encode_stage_fields(stage).expect("encode"));
        }

        let decoded = decode_execution(ExecutionType::Pipeline, &execution.id, &fields, &[]).expect("decode");
        assert_eq!(decoded.application, execution.application);
        assert_eq!(decoded.status, execution.status);
        assert_eq!(decoded.build_time, execution.build_time);
        assert_eq!(decoded.stages.len(), 2);
        assert_eq!(decoded.stages[0].id, StageId::new("s1"));
        assert_eq!(decoded.stages[1].id, StageId::new("s2"));
        for stage in &decoded.stages {
            assert_eq!(stage.execution_id.as_ref(), Some(&decoded.id));
        }
        assert_eq!(
            decoded.pipeline.as_ref().and_then(|p| p.pipeline_config_id.clone()),
            Some(PipelineConfigId::new("cfg"))
        );
        assert!(decoded.orchestration.is_none());
    }

    #[test]
    fn execution_fields_roundtrip_for_orchestration() {
        let mut execution = Execution::new_orchestration("o1", "demo");
        execution.orchestration.as_mut().expect("orchestration fields").description = Some("desc".to_string());
        let fields: HashMap<String, String> = encode_execution_fields(&execution).expect("encode").into_iter().collect();
        let decoded = decode_execution(ExecutionType::Orchestration, &execution.id, &fields, &[]).expect("decode");
        assert_eq!(decoded.orchestration.and_then(|o| o.description), Some("desc".to_string()));
        assert!(decoded.pipeline.is_none());
    }

    #[test]
    fn unknown_execution_engine_falls_back_to_default() {
        let mut fields = HashMap::new();
        fields.insert("application".to_string(), "demo".to_string());
        fields.insert("status".to_string(), "NOT_STARTED".to_string());
        fields.insert("buildTime".to_string(), "1000".to_string());
        let decoded = decode_execution(ExecutionType::Orchestration, &ExecutionId::new("o1"), &fields, &[]).expect("decode");
        assert_eq!(decoded.execution_engine, execution_repo_core::DEFAULT_EXECUTION_ENGINE);
    }

    #[test]
    fn status_wire_strings_roundtrip() {
        let statuses = [
            ExecutionStatus::NotStarted,
            ExecutionStatus::Running,
            ExecutionStatus::Paused,
            ExecutionStatus::Succeeded,
            ExecutionStatus::Canceled,
            ExecutionStatus::Stopped,
            ExecutionStatus::Terminal,
            ExecutionStatus::FailedContinue,
            ExecutionStatus::Failed,
            ExecutionStatus::Skipped,
            ExecutionStatus::Buffered,
            ExecutionStatus::Redirect,
        ];
        for status in statuses {
            let wire = status_to_str(status);
            assert_eq!(status_from_str(wire).expect("parse"), status);
        }
    }

    #[test]
    fn unknown_status_string_fails_to_decode() {
        assert!(status_from_str("NOT_A_STATUS").is_err());
    }

    #[test]
    fn synthetic_owner_wire_strings_roundtrip() {
        for owner in [SyntheticStageOwner::Unset, SyntheticStageOwner::StageBefore, SyntheticStageOwner::StageAfter] {
            let wire = synthetic_owner_to_str(owner);
            assert_eq!(synthetic_owner_from_str(wire).expect("parse"), owner);
        }
    }

    proptest! {
        #[test]
        fn stage_index_roundtrips_for_any_comma_free_ids(ids in proptest::collection::vec("[a-zA-Z0-9_-]{1,12}", 0..20)) {
            let stage_ids: Vec<StageId> = ids.iter().cloned().map(StageId::new).collect();
            let encoded = encode_stage_index(&stage_ids);
            let decoded = decode_stage_index(&encoded);
            prop_assert_eq!(decoded, stage_ids);
        }
    }
}
