// crates/execution-repo-redis/src/lib.rs
// ============================================================================
// Module: Execution Repository Redis Backend
// Description: Redis-backed ExecutionRepository with primary/previous
//              backend routing.
// Purpose: Crate root re-exporting the Redis backend's public surface.
// Dependencies: execution_repo_core, redis, tokio
// ============================================================================

//! ## Overview
//! This crate implements [`execution_repo_core::ExecutionRepository`] over
//! Redis. An execution's aggregate (itself plus its stages) is encoded as a
//! single hash with namespaced stage fields (§4.2); application, pipeline
//! configuration, correlation, and full-type indices are maintained as
//! companion set/sorted-set/string keys (§4.6, §4.7). A rolling migration
//! can configure both a primary and a previous backend: writes always go to
//! the primary, and reads fall back to the previous backend only on a
//! primary miss (§4.1).

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod backend;
pub mod codec;
pub mod config;
pub mod correlation;
pub mod error;
pub mod lifecycle;
pub mod query;
pub mod reader;
pub mod repository;
pub mod writer;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use backend::BackendRouter;
pub use config::RedisRepositoryConfig;
pub use error::RedisBackendError;
pub use repository::RedisExecutionRepository;
