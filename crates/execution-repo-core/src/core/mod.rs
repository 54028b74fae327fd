// crates/execution-repo-core/src/core/mod.rs
// ============================================================================
// Module: Core Domain
// Description: Declares the execution repository's identifier, time, model,
//              and query-criteria submodules.
// Purpose: Group the backend-independent domain types.
// Dependencies: None (submodules only)
// ============================================================================

pub mod criteria;
pub mod identifiers;
pub mod model;
pub mod time;

pub use criteria::QueryCriteria;
pub use identifiers::ApplicationId;
pub use identifiers::CorrelationId;
pub use identifiers::ExecutionId;
pub use identifiers::PipelineConfigId;
pub use identifiers::StageId;
pub use identifiers::StageRefId;
pub use model::Execution;
pub use model::ExecutionStatus;
pub use model::ExecutionType;
pub use model::OrchestrationFields;
pub use model::PausedDetails;
pub use model::PipelineFields;
pub use model::Stage;
pub use model::SyntheticStageOwner;
pub use model::Task;
pub use model::Trigger;
pub use model::DEFAULT_EXECUTION_ENGINE;
