// crates/execution-repo-core/src/lib.rs
// ============================================================================
// Module: Execution Repository Core
// Description: Backend-independent domain model and repository interface.
// Purpose: Crate root re-exporting the execution repository's public surface.
// Dependencies: crate::core, crate::error, crate::interfaces
// ============================================================================

//! ## Overview
//! `execution-repo-core` defines the execution/stage/task domain model, the
//! [`RepositoryError`] error surface, and the [`ExecutionRepository`] trait
//! that a concrete backend (e.g. `execution-repo-redis`) implements. It has
//! no knowledge of any particular storage technology.

/// Backend-independent domain model: identifiers, timestamps, the
/// execution/stage/task aggregate, and query criteria.
pub mod core;
/// Domain-level error type shared by every repository operation.
pub mod error;
/// The `ExecutionRepository` trait consumed by the execution engine.
pub mod interfaces;

pub use crate::core::ApplicationId;
pub use crate::core::CorrelationId;
pub use crate::core::Execution;
pub use crate::core::ExecutionId;
pub use crate::core::ExecutionStatus;
pub use crate::core::ExecutionType;
pub use crate::core::OrchestrationFields;
pub use crate::core::PausedDetails;
pub use crate::core::PipelineConfigId;
pub use crate::core::PipelineFields;
pub use crate::core::QueryCriteria;
pub use crate::core::Stage;
pub use crate::core::StageId;
pub use crate::core::StageRefId;
pub use crate::core::SyntheticStageOwner;
pub use crate::core::Task;
pub use crate::core::Trigger;
pub use crate::core::DEFAULT_EXECUTION_ENGINE;
pub use crate::error::RepositoryError;
pub use crate::interfaces::ExecutionRepository;
pub use crate::interfaces::ExecutionStream;
