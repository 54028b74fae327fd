// crates/execution-repo-redis/src/repository.rs
// ============================================================================
// Module: Redis Execution Repository
// Description: Top-level ExecutionRepository implementation tying together
//              the backend router, codec, writer, reader, lifecycle
//              controller, query streamer, and correlation index.
// Purpose: Expose the full repository API over Redis (§6).
// Dependencies: execution_repo_core, crate::{backend,config,lifecycle,
//               query,reader,writer,correlation}
// ============================================================================

//! ## Overview
//! [`RedisExecutionRepository`] is the crate's public entry point. It owns a
//! [`BackendRouter`] and the validated [`RedisRepositoryConfig`], and
//! delegates every [`ExecutionRepository`] method to the module that
//! implements it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use execution_repo_core::ApplicationId;
use execution_repo_core::CorrelationId;
use execution_repo_core::Execution;
use execution_repo_core::ExecutionId;
use execution_repo_core::ExecutionRepository;
use execution_repo_core::ExecutionStatus;
use execution_repo_core::ExecutionStream;
use execution_repo_core::ExecutionType;
use execution_repo_core::PipelineConfigId;
use execution_repo_core::QueryCriteria;
use execution_repo_core::RepositoryError;
use execution_repo_core::Stage;
use execution_repo_core::StageId;

use crate::backend::BackendRouter;
use crate::config::RedisRepositoryConfig;
use crate::correlation;
use crate::lifecycle;
use crate::query;
use crate::reader;
use crate::writer;

/// Redis-backed implementation of [`ExecutionRepository`] (§6).
pub struct RedisExecutionRepository {
    /// Routes each operation to the backend(s) that hold its execution.
    router: Arc<BackendRouter>,
    /// Validated tuning and connection parameters.
    config: Arc<RedisRepositoryConfig>,
}

impl RedisExecutionRepository {
    /// Connects to the configured backends and validates tuning parameters.
    ///
    /// # Errors
    /// Returns [`RepositoryError::InvalidArgument`] if `config` fails
    /// validation, or [`RepositoryError::BackendError`] if connecting to
    /// either backend fails.
    pub async fn connect(config: RedisRepositoryConfig) -> Result<Self, RepositoryError> {
        config.validate()?;
        let router = BackendRouter::connect(&config).await?;
        Ok(Self { router: Arc::new(router), config: Arc::new(config) })
    }
}

#[async_trait]
impl ExecutionRepository for RedisExecutionRepository {
    async fn store_execution(&self, execution: &Execution) -> Result<(), RepositoryError> {
        writer::store_execution(self.router.primary(), execution).await
    }

    async fn store_stage(&self, execution_id: &ExecutionId, stage: &Stage) -> Result<(), RepositoryError> {
        let execution_type = stage_execution_type(&self.router, execution_id).await?;
        writer::store_stage(self.router.primary(), execution_type, execution_id, stage).await
    }

    async fn update_stage_context(
        &self,
        execution_id: &ExecutionId,
        stage_id: &StageId,
        context: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), RepositoryError> {
        let execution_type = stage_execution_type(&self.router, execution_id).await?;
        writer::update_stage_context(self.router.primary(), execution_type, execution_id, stage_id, context).await
    }

    async fn add_stage(&self, execution_id: &ExecutionId, stage: Stage) -> Result<(), RepositoryError> {
        let execution_type = stage_execution_type(&self.router, execution_id).await?;
        writer::add_stage(self.router.primary(), execution_type, execution_id, stage).await
    }

    async fn remove_stage(&self, execution_id: &ExecutionId, stage_id: &StageId) -> Result<(), RepositoryError> {
        let execution_type = stage_execution_type(&self.router, execution_id).await?;
        writer::remove_stage(self.router.primary(), execution_type, execution_id, stage_id).await
    }

    async fn retrieve(&self, execution_type: ExecutionType, id: &ExecutionId) -> Result<Execution, RepositoryError> {
        reader::retrieve(&self.router, execution_type, id).await
    }

    async fn cancel(
        &self,
        execution_type: ExecutionType,
        id: &ExecutionId,
        canceled_by: Option<String>,
        reason: Option<String>,
    ) -> Result<(), RepositoryError> {
        lifecycle::cancel(self.router.primary(), execution_type, id, canceled_by, reason).await
    }

    async fn pause(
        &self,
        execution_type: ExecutionType,
        id: &ExecutionId,
        paused_by: Option<String>,
    ) -> Result<(), RepositoryError> {
        lifecycle::pause(self.router.primary(), execution_type, id, paused_by).await
    }

    async fn resume(
        &self,
        execution_type: ExecutionType,
        id: &ExecutionId,
        resumed_by: Option<String>,
    ) -> Result<(), RepositoryError> {
        lifecycle::resume(self.router.primary(), execution_type, id, resumed_by).await
    }

    async fn update_status(
        &self,
        execution_type: ExecutionType,
        id: &ExecutionId,
        status: ExecutionStatus,
    ) -> Result<(), RepositoryError> {
        lifecycle::update_status(self.router.primary(), execution_type, id, status).await
    }

    async fn delete(&self, execution_type: ExecutionType, id: &ExecutionId) -> Result<(), RepositoryError> {
        lifecycle::delete(self.router.primary(), execution_type, id).await
    }

    async fn store_execution_context(
        &self,
        execution_type: ExecutionType,
        id: &ExecutionId,
        context: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), RepositoryError> {
        lifecycle::store_execution_context(&self.router, &self.config, execution_type, id, context).await
    }

    async fn is_canceled(&self, execution_type: ExecutionType, id: &ExecutionId) -> Result<bool, RepositoryError> {
        lifecycle::is_canceled(self.router.primary(), execution_type, id).await
    }

    fn retrieve_for_type(&self, execution_type: ExecutionType, criteria: QueryCriteria) -> ExecutionStream {
        query::retrieve_for_type(Arc::clone(&self.router), Arc::clone(&self.config), execution_type, criteria)
    }

    fn retrieve_pipelines_for_application(&self, application: &ApplicationId) -> ExecutionStream {
        query::retrieve_pipelines_for_application(Arc::clone(&self.router), Arc::clone(&self.config), application)
    }

    fn retrieve_pipelines_for_pipeline_config_id(
        &self,
        pipeline_config_id: &PipelineConfigId,
        criteria: QueryCriteria,
    ) -> ExecutionStream {
        query::retrieve_pipelines_for_pipeline_config_id(
            Arc::clone(&self.router),
            Arc::clone(&self.config),
            pipeline_config_id,
            criteria,
        )
    }

    fn retrieve_orchestrations_for_application(
        &self,
        application: &ApplicationId,
        criteria: QueryCriteria,
    ) -> ExecutionStream {
        query::retrieve_orchestrations_for_application(
            Arc::clone(&self.router),
            Arc::clone(&self.config),
            application,
            criteria,
        )
    }

    async fn retrieve_orchestration_for_correlation_id(
        &self,
        correlation_id: &CorrelationId,
    ) -> Result<Execution, RepositoryError> {
        correlation::retrieve_orchestration_for_correlation_id(&self.router, correlation_id).await
    }
}

/// Resolves a stage-owning execution's type, since stage-targeted writes
/// only carry an execution id (§4.3). Pipelines are tried before
/// orchestrations since pipeline writes dominate typical workloads.
async fn stage_execution_type(router: &BackendRouter, execution_id: &ExecutionId) -> Result<ExecutionType, RepositoryError> {
    if reader::fetch(router.primary(), ExecutionType::Pipeline, execution_id).await?.is_some() {
        return Ok(ExecutionType::Pipeline);
    }
    if reader::fetch(router.primary(), ExecutionType::Orchestration, execution_id).await?.is_some() {
        return Ok(ExecutionType::Orchestration);
    }
    if let Some(previous) = router.previous() {
        if reader::fetch(previous.clone(), ExecutionType::Pipeline, execution_id).await?.is_some() {
            return Ok(ExecutionType::Pipeline);
        }
        if reader::fetch(previous, ExecutionType::Orchestration, execution_id).await?.is_some() {
            return Ok(ExecutionType::Orchestration);
        }
    }
    Err(RepositoryError::NotFound(format!("execution {execution_id} not found")))
}
