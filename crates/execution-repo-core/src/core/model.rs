// crates/execution-repo-core/src/core/model.rs
// ============================================================================
// Module: Execution Repository Domain Model
// Description: Execution, stage, and task aggregate types (spec §3).
// Purpose: Provide the canonical in-memory shape of the execution aggregate.
// Dependencies: crate::core::{identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! The execution aggregate is a tree: one [`Execution`] owns an ordered list
//! of [`Stage`]s, each of which owns an ordered list of opaque [`Task`]s. The
//! aggregate is modeled as a tree on purpose (§9 design note): a `Stage`
//! never stores its owning execution id as part of its serialized form. The
//! repository layer reconstructs that back-reference at decode time as a
//! non-owning handle.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::ApplicationId;
use crate::core::identifiers::CorrelationId;
use crate::core::identifiers::ExecutionId;
use crate::core::identifiers::PipelineConfigId;
use crate::core::identifiers::StageId;
use crate::core::identifiers::StageRefId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Execution Type & Status
// ============================================================================

/// Discriminates the two execution kinds held by the repository (§3).
///
/// # Invariants
/// - Determines which of `pipeline_fields` / `orchestration_fields` on
///   [`Execution`] is populated, and which key prefix (`pipeline:` or
///   `orchestration:`) the repository uses for the record (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionType {
    /// A long-running execution versioned by a pipeline configuration id.
    Pipeline,
    /// An ad-hoc, application-scoped execution.
    Orchestration,
}

impl ExecutionType {
    /// Returns the lowercase key prefix used for this type in backend keys
    /// (`pipeline:<id>`, `allJobs:pipeline`, ..., §6).
    #[must_use]
    pub const fn key_prefix(self) -> &'static str {
        match self {
            Self::Pipeline => "pipeline",
            Self::Orchestration => "orchestration",
        }
    }
}

/// Lifecycle status shared by executions and stages (§3).
///
/// # Invariants
/// - [`ExecutionStatus::complete`] is the authoritative predicate consumed
///   by `updateStatus` (§4.5) and the Query Streamer's status pre-filter
///   (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// Created but not yet picked up by a runner.
    NotStarted,
    /// Actively executing.
    Running,
    /// Suspended by an operator; resumable.
    Paused,
    /// Completed without error.
    Succeeded,
    /// Canceled before or during execution.
    Canceled,
    /// Stopped by an operator or the engine without completing.
    Stopped,
    /// Reached a terminal state outside the normal success/failure paths.
    Terminal,
    /// Failed but configured to continue downstream stages.
    FailedContinue,
    /// Failed outright.
    Failed,
    /// Skipped by branching or conditional logic.
    Skipped,
    /// Queued pending a concurrency slot.
    Buffered,
    /// Redirected to an alternate stage.
    Redirect,
}

impl ExecutionStatus {
    /// Returns whether this status represents a finished execution/stage
    /// (§3 invariant 6, §4.5 `updateStatus`).
    #[must_use]
    pub const fn complete(self) -> bool {
        !matches!(self, Self::NotStarted | Self::Running | Self::Paused | Self::Buffered)
    }
}

/// Identifies a synthetic stage's relationship to its parent (§3, GLOSSARY).
///
/// # Invariants
/// - `Unset` means the stage is authored, not synthetic; `addStage` (§4.3)
///   requires a non-`Unset` owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyntheticStageOwner {
    /// Stage is not synthetic.
    Unset,
    /// Synthetic stage inserted immediately before its parent.
    StageBefore,
    /// Synthetic stage inserted immediately after its parent.
    StageAfter,
}

// ============================================================================
// SECTION: Task
// ============================================================================

/// Opaque stage child, persisted and restored whole (§3).
///
/// # Invariants
/// - The repository never interprets task contents; it is a pass-through
///   JSON value.
#[expect(clippy::derive_partial_eq_without_eq, reason = "serde_json::Value does not implement Eq")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Task(pub Value);

// ============================================================================
// SECTION: Stage
// ============================================================================

/// One node of an execution's stage list (§3).
///
/// # Invariants
/// - `execution_id` is a non-owning back-reference reconstructed at decode
///   time (§9); it is never part of the persisted field map.
/// - `requisite_stage_ref_ids` references other stages' `ref_id`, not `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Globally unique stage id, used to namespace `stage.<id>.*` fields.
    pub id: StageId,
    /// Caller-chosen logical id, unique within the owning execution.
    pub ref_id: StageRefId,
    /// Stage type tag interpreted by the (out-of-scope) execution engine.
    pub stage_type: String,
    /// Human-facing stage name.
    pub name: Option<String>,
    /// Wall-clock time the stage started.
    pub start_time: Option<Timestamp>,
    /// Wall-clock time the stage ended.
    pub end_time: Option<Timestamp>,
    /// Current stage status.
    pub status: ExecutionStatus,
    /// Synthetic-stage relationship to `parent_stage_id`.
    pub synthetic_stage_owner: SyntheticStageOwner,
    /// Parent stage id for synthetic stages.
    pub parent_stage_id: Option<StageId>,
    /// Ref ids of stages that must complete before this one starts.
    pub requisite_stage_ref_ids: BTreeSet<StageRefId>,
    /// Wall-clock time the stage is scheduled to run.
    pub scheduled_time: Option<Timestamp>,
    /// Arbitrary string-keyed stage context.
    pub context: Map<String, Value>,
    /// Arbitrary string-keyed stage outputs.
    pub outputs: Map<String, Value>,
    /// Ordered task sequence.
    pub tasks: Vec<Task>,
    /// Small audit dictionary (`lastModifiedBy`, `allowedAttempts`, ...).
    pub last_modified: Map<String, Value>,
    /// Non-owning back-reference to the owning execution, reconstructed on
    /// decode. Never serialized.
    #[serde(skip, default)]
    pub execution_id: Option<ExecutionId>,
}

impl Stage {
    /// Creates a new authored (non-synthetic) stage.
    #[must_use]
    pub fn new(id: impl Into<StageId>, ref_id: impl Into<StageRefId>, stage_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ref_id: ref_id.into(),
            stage_type: stage_type.into(),
            name: None,
            start_time: None,
            end_time: None,
            status: ExecutionStatus::NotStarted,
            synthetic_stage_owner: SyntheticStageOwner::Unset,
            parent_stage_id: None,
            requisite_stage_ref_ids: BTreeSet::new(),
            scheduled_time: None,
            context: Map::new(),
            outputs: Map::new(),
            tasks: Vec::new(),
            last_modified: Map::new(),
            execution_id: None,
        }
    }

    /// Returns whether this stage is synthetic (declares a parent and a
    /// before/after owner, the `addStage` precondition, §4.3).
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.synthetic_stage_owner != SyntheticStageOwner::Unset && self.parent_stage_id.is_some()
    }
}

// ============================================================================
// SECTION: Trigger
// ============================================================================

/// Structured trigger dictionary attached to an execution (§3).
///
/// # Invariants
/// - `correlation_id` and `parent_execution`, when present, are reified from
///   well-known keys (`correlationId`, `parentExecution`) during decode
///   (§4.2); `fields` holds every other caller-supplied key verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Trigger {
    /// External correlation key, when present.
    pub correlation_id: Option<CorrelationId>,
    /// Nested parent execution, when this execution was triggered by another.
    pub parent_execution: Option<Box<Execution>>,
    /// Every other trigger field, opaque to the repository.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

// ============================================================================
// SECTION: Paused Details
// ============================================================================

/// Pause/resume audit fields (§3, §4.5 `pause`/`resume`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PausedDetails {
    /// Identity that paused the execution.
    pub paused_by: Option<String>,
    /// Wall-clock time the execution was paused.
    pub pause_time: Option<Timestamp>,
    /// Identity that resumed the execution.
    pub resumed_by: Option<String>,
    /// Wall-clock time the execution was resumed.
    pub resume_time: Option<Timestamp>,
}

// ============================================================================
// SECTION: Kind-Specific Fields
// ============================================================================

/// Fields carried only by pipeline executions (§3).
#[expect(clippy::derive_partial_eq_without_eq, reason = "serde_json::Value does not implement Eq")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PipelineFields {
    /// Pipeline display name.
    pub name: Option<String>,
    /// Identifier of the pipeline configuration this execution runs.
    pub pipeline_config_id: Option<PipelineConfigId>,
    /// Notification configuration, opaque to the repository.
    pub notifications: Vec<Value>,
    /// Snapshot of the pipeline configuration at trigger time.
    pub initial_config: Map<String, Value>,
}

/// Fields carried only by orchestration executions (§3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OrchestrationFields {
    /// Human-facing description.
    pub description: Option<String>,
}

// ============================================================================
// SECTION: Execution
// ============================================================================

/// Root aggregate: one run of a workflow (§3).
///
/// # Invariants
/// - `pipeline` is `Some` iff `execution_type == Pipeline`; `orchestration`
///   is `Some` iff `execution_type == Orchestration` (enforced by the
///   constructors, not by the type system, to keep the wire shape flat).
/// - `stages` order is authoritative (§3 invariant 2); the repository's
///   denormalized `stageIndex` field must agree with it after every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    /// Globally unique execution id.
    pub id: ExecutionId,
    /// Pipeline or orchestration.
    pub execution_type: ExecutionType,
    /// Application tag.
    pub application: ApplicationId,
    /// Current lifecycle status.
    pub status: ExecutionStatus,
    /// Wall-clock time the execution record was created.
    pub build_time: Timestamp,
    /// Wall-clock time execution started running.
    pub start_time: Option<Timestamp>,
    /// Wall-clock time execution reached a complete status.
    pub end_time: Option<Timestamp>,
    /// Cancellation flag (§3 invariant 6).
    pub canceled: bool,
    /// Identity that requested cancellation.
    pub canceled_by: Option<String>,
    /// Caller-supplied cancellation reason.
    pub cancellation_reason: Option<String>,
    /// Whether concurrent executions of the same configuration are limited.
    pub limit_concurrent: bool,
    /// Whether queued executions should keep waiting rather than be
    /// canceled when a newer execution starts.
    pub keep_waiting_pipelines: bool,
    /// Opaque authentication/authorization context.
    pub authentication: Option<Value>,
    /// Pause/resume audit fields.
    pub paused: Option<PausedDetails>,
    /// Execution-engine tag; falls back to a default when unknown (§4.2).
    pub execution_engine: String,
    /// Origin of the triggering request.
    pub origin: Option<String>,
    /// Trigger that started this execution.
    pub trigger: Trigger,
    /// Ordered stage list (authoritative order, §3 invariant 2).
    pub stages: Vec<Stage>,
    /// Pipeline-only fields; `Some` iff `execution_type == Pipeline`.
    pub pipeline: Option<PipelineFields>,
    /// Orchestration-only fields; `Some` iff `execution_type ==
    /// Orchestration`.
    pub orchestration: Option<OrchestrationFields>,
}

/// Default execution-engine tag used when a stored value is unknown or
/// absent (§4.2).
pub const DEFAULT_EXECUTION_ENGINE: &str = "v2";

impl Execution {
    /// Creates a new pipeline execution shell with no stages.
    #[must_use]
    pub fn new_pipeline(id: impl Into<ExecutionId>, application: impl Into<ApplicationId>) -> Self {
        Self {
            id: id.into(),
            execution_type: ExecutionType::Pipeline,
            application: application.into(),
            status: ExecutionStatus::NotStarted,
            build_time: Timestamp::now(),
            start_time: None,
            end_time: None,
            canceled: false,
            canceled_by: None,
            cancellation_reason: None,
            limit_concurrent: false,
            keep_waiting_pipelines: false,
            authentication: None,
            paused: None,
            execution_engine: DEFAULT_EXECUTION_ENGINE.to_string(),
            origin: None,
            trigger: Trigger::default(),
            stages: Vec::new(),
            pipeline: Some(PipelineFields::default()),
            orchestration: None,
        }
    }

    /// Creates a new orchestration execution shell with no stages.
    #[must_use]
    pub fn new_orchestration(id: impl Into<ExecutionId>, application: impl Into<ApplicationId>) -> Self {
        Self {
            id: id.into(),
            execution_type: ExecutionType::Orchestration,
            application: application.into(),
            status: ExecutionStatus::NotStarted,
            build_time: Timestamp::now(),
            start_time: None,
            end_time: None,
            canceled: false,
            canceled_by: None,
            cancellation_reason: None,
            limit_concurrent: false,
            keep_waiting_pipelines: false,
            authentication: None,
            paused: None,
            execution_engine: DEFAULT_EXECUTION_ENGINE.to_string(),
            origin: None,
            trigger: Trigger::default(),
            stages: Vec::new(),
            pipeline: None,
            orchestration: Some(OrchestrationFields::default()),
        }
    }

    /// Returns the stage with the given id, if present.
    #[must_use]
    pub fn stage(&self, id: &StageId) -> Option<&Stage> {
        self.stages.iter().find(|stage| &stage.id == id)
    }

    /// Re-parents every stage's non-owning `execution_id` back-reference to
    /// this execution (§9 design note).
    pub fn reparent_stages(&mut self) {
        for stage in &mut self.stages {
            stage.execution_id = Some(self.id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, reason = "Unit tests use expect/unwrap for setup clarity.")]

    use super::*;

    #[test]
    fn not_started_running_paused_buffered_are_incomplete() {
        assert!(!ExecutionStatus::NotStarted.complete());
        assert!(!ExecutionStatus::Running.complete());
        assert!(!ExecutionStatus::Paused.complete());
        assert!(!ExecutionStatus::Buffered.complete());
    }

    #[test]
    fn terminal_statuses_are_complete() {
        for status in [
            ExecutionStatus::Succeeded,
            ExecutionStatus::Canceled,
            ExecutionStatus::Stopped,
            ExecutionStatus::Terminal,
            ExecutionStatus::FailedContinue,
            ExecutionStatus::Failed,
            ExecutionStatus::Skipped,
            ExecutionStatus::Redirect,
        ] {
            assert!(status.complete(), "{status:?} should be complete");
        }
    }

    #[test]
    fn stage_without_parent_or_owner_is_not_synthetic() {
        let stage = Stage::new("s1", "ref1", "wait");
        assert!(!stage.is_synthetic());
    }

    #[test]
    fn stage_with_owner_but_no_parent_is_not_synthetic() {
        let mut stage = Stage::new("s1", "ref1", "wait");
        stage.synthetic_stage_owner = SyntheticStageOwner::StageBefore;
        assert!(!stage.is_synthetic());
    }

    #[test]
    fn stage_with_owner_and_parent_is_synthetic() {
        let mut stage = Stage::new("s1", "ref1", "wait");
        stage.synthetic_stage_owner = SyntheticStageOwner::StageAfter;
        stage.parent_stage_id = Some(StageId::new("parent"));
        assert!(stage.is_synthetic());
    }

    #[test]
    fn new_pipeline_populates_pipeline_fields_only() {
        let execution = Execution::new_pipeline("p1", "demo");
        assert_eq!(execution.execution_type, ExecutionType::Pipeline);
        assert!(execution.pipeline.is_some());
        assert!(execution.orchestration.is_none());
    }

    #[test]
    fn new_orchestration_populates_orchestration_fields_only() {
        let execution = Execution::new_orchestration("o1", "demo");
        assert_eq!(execution.execution_type, ExecutionType::Orchestration);
        assert!(execution.orchestration.is_some());
        assert!(execution.pipeline.is_none());
    }

    #[test]
    fn reparent_stages_sets_back_reference_on_every_stage() {
        let mut execution = Execution::new_pipeline("p1", "demo");
        execution.stages.push(Stage::new("s1", "ref1", "wait"));
        execution.stages.push(Stage::new("s2", "ref2", "wait"));
        execution.reparent_stages();
        for stage in &execution.stages {
            assert_eq!(stage.execution_id.as_ref(), Some(&execution.id));
        }
    }

    #[test]
    fn stage_lookup_finds_by_id() {
        let mut execution = Execution::new_pipeline("p1", "demo");
        execution.stages.push(Stage::new("s1", "ref1", "wait"));
        assert!(execution.stage(&StageId::new("s1")).is_some());
        assert!(execution.stage(&StageId::new("missing")).is_none());
    }

    #[test]
    fn execution_status_serde_roundtrip() {
        for status in [
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
        ] {
            let json = serde_json::to_string(&status).expect("serialize");
            let restored: ExecutionStatus = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(status, restored);
        }
    }
}
