// crates/execution-repo-core/src/interfaces/mod.rs
// ============================================================================
// Module: Execution Repository Interfaces
// Description: Backend-agnostic repository trait consumed by the execution
//              engine.
// Purpose: Decouple the engine from the concrete storage backend (§4, §6).
// Dependencies: crate::core, crate::error, async-trait, tokio-stream
// ============================================================================

//! ## Overview
//! [`ExecutionRepository`] is the single seam between the (out-of-scope)
//! execution engine and a concrete storage backend. Everything the engine
//! needs from durable storage — writing, reading, lifecycle transitions,
//! streaming queries, and correlation lookups — is expressed here; nothing
//! about Redis, SQL, or any other physical store leaks through.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::pin::Pin;

use async_trait::async_trait;
use tokio_stream::Stream;

use crate::core::Execution;
use crate::core::ExecutionId;
use crate::core::ExecutionStatus;
use crate::core::ExecutionType;
use crate::core::PipelineConfigId;
use crate::core::QueryCriteria;
use crate::core::Stage;
use crate::core::StageId;
use crate::error::RepositoryError;

// ============================================================================
// SECTION: ExecutionStream
// ============================================================================

/// Lazily produced sequence of executions returned by the streaming
/// retrieval operations (§4.6).
///
/// # Invariants
/// - Consumers may stop polling at any point; unread executions are never
///   materialized (§4.6 design note on chunked, bounded fan-out).
pub type ExecutionStream = Pin<Box<dyn Stream<Item = Result<Execution, RepositoryError>> + Send>>;

// ============================================================================
// SECTION: ExecutionRepository
// ============================================================================

/// The durable state layer consumed by the execution engine (§6 Exposed
/// API).
///
/// # Invariants
/// - Every write is scoped to the primary backend only; reads consult the
///   primary first and fall back to the previous backend only when the
///   primary has no record (§4.1).
#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    /// Persists a new execution or fully overwrites an existing one (§4.3).
    ///
    /// # Errors
    /// Returns [`RepositoryError::BackendError`] if the backend write fails.
    async fn store_execution(&self, execution: &Execution) -> Result<(), RepositoryError>;

    /// Persists a single stage within an already-stored execution (§4.3).
    ///
    /// # Errors
    /// Returns [`RepositoryError::NotFound`] if the owning execution does
    /// not exist, or [`RepositoryError::BackendError`] on backend failure.
    async fn store_stage(&self, execution_id: &ExecutionId, stage: &Stage) -> Result<(), RepositoryError>;

    /// Replaces a stage's `context` map in place (§4.3).
    ///
    /// # Errors
    /// Returns [`RepositoryError::NotFound`] if the stage does not exist.
    async fn update_stage_context(
        &self,
        execution_id: &ExecutionId,
        stage_id: &StageId,
        context: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), RepositoryError>;

    /// Splices a synthetic stage into an execution's ordered stage list
    /// (§4.3).
    ///
    /// # Errors
    /// Returns [`RepositoryError::InvalidArgument`] if `stage` is not
    /// synthetic, or [`RepositoryError::NotFound`] if the owning execution
    /// or `stage.parent_stage_id` does not exist.
    async fn add_stage(&self, execution_id: &ExecutionId, stage: Stage) -> Result<(), RepositoryError>;

    /// Removes a stage and its namespaced fields from an execution (§4.3).
    ///
    /// # Errors
    /// Returns [`RepositoryError::NotFound`] if the stage does not exist.
    async fn remove_stage(&self, execution_id: &ExecutionId, stage_id: &StageId) -> Result<(), RepositoryError>;

    /// Retrieves a single execution by id (§4.4).
    ///
    /// # Errors
    /// Returns [`RepositoryError::NotFound`] if no backend holds a record
    /// for `id`.
    async fn retrieve(&self, execution_type: ExecutionType, id: &ExecutionId) -> Result<Execution, RepositoryError>;

    /// Marks an execution canceled (§4.5).
    ///
    /// # Errors
    /// Returns [`RepositoryError::NotFound`] if the execution does not
    /// exist.
    async fn cancel(
        &self,
        execution_type: ExecutionType,
        id: &ExecutionId,
        canceled_by: Option<String>,
        reason: Option<String>,
    ) -> Result<(), RepositoryError>;

    /// Pauses a running execution (§4.5).
    ///
    /// # Errors
    /// Returns [`RepositoryError::InvalidState`] if the execution is not
    /// running, or [`RepositoryError::NotFound`] if it does not exist.
    async fn pause(
        &self,
        execution_type: ExecutionType,
        id: &ExecutionId,
        paused_by: Option<String>,
    ) -> Result<(), RepositoryError>;

    /// Resumes a paused execution (§4.5).
    ///
    /// # Errors
    /// Returns [`RepositoryError::InvalidState`] if the execution is not
    /// paused, or [`RepositoryError::NotFound`] if it does not exist.
    async fn resume(
        &self,
        execution_type: ExecutionType,
        id: &ExecutionId,
        resumed_by: Option<String>,
    ) -> Result<(), RepositoryError>;

    /// Updates an execution's status, stamping `end_time` when the new
    /// status is complete (§4.5).
    ///
    /// # Errors
    /// Returns [`RepositoryError::NotFound`] if the execution does not
    /// exist.
    async fn update_status(
        &self,
        execution_type: ExecutionType,
        id: &ExecutionId,
        status: ExecutionStatus,
    ) -> Result<(), RepositoryError>;

    /// Deletes an execution and every index entry referencing it (§4.5).
    ///
    /// # Errors
    /// Returns [`RepositoryError::BackendError`] on backend failure. A
    /// missing execution is not an error.
    async fn delete(&self, execution_type: ExecutionType, id: &ExecutionId) -> Result<(), RepositoryError>;

    /// Atomically overwrites an execution's trigger-level context under
    /// optimistic concurrency control (§4.5).
    ///
    /// # Errors
    /// Returns [`RepositoryError::NotFound`] if the execution does not
    /// exist, or [`RepositoryError::BackendError`] if the retry budget is
    /// exhausted under contention.
    async fn store_execution_context(
        &self,
        execution_type: ExecutionType,
        id: &ExecutionId,
        context: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), RepositoryError>;

    /// Returns whether an execution has been canceled (§4.5).
    ///
    /// # Errors
    /// Returns [`RepositoryError::NotFound`] if the execution does not
    /// exist.
    async fn is_canceled(&self, execution_type: ExecutionType, id: &ExecutionId) -> Result<bool, RepositoryError>;

    /// Streams every execution of a given type across both backends,
    /// de-duplicating in favor of the primary (§4.6).
    fn retrieve_for_type(&self, execution_type: ExecutionType, criteria: QueryCriteria) -> ExecutionStream;

    /// Streams pipeline executions for an application (§4.6).
    fn retrieve_pipelines_for_application(&self, application: &crate::core::ApplicationId) -> ExecutionStream;

    /// Streams pipeline executions for a specific pipeline configuration
    /// (§4.6).
    fn retrieve_pipelines_for_pipeline_config_id(
        &self,
        pipeline_config_id: &PipelineConfigId,
        criteria: QueryCriteria,
    ) -> ExecutionStream;

    /// Streams orchestration executions for an application (§4.6).
    fn retrieve_orchestrations_for_application(
        &self,
        application: &crate::core::ApplicationId,
        criteria: QueryCriteria,
    ) -> ExecutionStream;

    /// Resolves the in-flight orchestration registered under a correlation
    /// key, if any (§4.7).
    ///
    /// # Errors
    /// Returns [`RepositoryError::NotFound`] if no orchestration is
    /// registered under `correlation_id`, or if the registered orchestration
    /// has since completed.
    async fn retrieve_orchestration_for_correlation_id(
        &self,
        correlation_id: &crate::core::CorrelationId,
    ) -> Result<Execution, RepositoryError>;
}
