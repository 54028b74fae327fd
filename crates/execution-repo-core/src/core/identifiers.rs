// crates/execution-repo-core/src/core/identifiers.rs
// ============================================================================
// Module: Execution Repository Identifiers
// Description: Canonical opaque identifiers for executions, stages, and tenants.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout the
//! execution repository. Identifiers are opaque UTF-8 strings with no
//! normalization or validation applied by these types — uniqueness and
//! format are caller responsibilities enforced by the surrounding engine,
//! not by the repository layer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Opaque, globally unique identifier for an execution (pipeline or
/// orchestration).
///
/// # Invariants
/// - Opaque UTF-8 string; uniqueness across backends is a caller invariant
///   (§3 invariant 3), not enforced by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    /// Creates a new execution identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ExecutionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ExecutionId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Caller-chosen logical identifier for a stage within its execution.
///
/// # Invariants
/// - Opaque UTF-8 string; unique only within the owning execution's stage
///   list, not globally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageRefId(String);

impl StageRefId {
    /// Creates a new stage reference identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageRefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for StageRefId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for StageRefId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Globally unique identifier for a stage, independent of its `refId`.
///
/// # Invariants
/// - Opaque UTF-8 string; used as the namespacing key for `stage.<id>.*`
///   fields (§4.2) and as the element type of the ordered stage-id list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(String);

impl StageId {
    /// Creates a new stage identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for StageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for StageId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Application tag scoping executions for per-application indices and
/// queries (`<type>:app:<app>`, §3, §6).
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(String);

impl ApplicationId {
    /// Creates a new application identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ApplicationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ApplicationId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Identifier of the versioned pipeline configuration a pipeline execution
/// was started from (§3).
///
/// # Invariants
/// - Opaque UTF-8 string. Executions without a configured id are stored
///   under the literal sentinel `---` (§6) by the repository, not by this
///   type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineConfigId(String);

impl PipelineConfigId {
    /// Creates a new pipeline configuration identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PipelineConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PipelineConfigId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PipelineConfigId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// External key de-duplicating in-flight orchestrations (§4.7, GLOSSARY).
///
/// # Invariants
/// - Opaque UTF-8 string; resolved through `correlation:<key>` (§6) only
///   while the pointed-to orchestration is incomplete (§3 invariant 4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Creates a new correlation identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CorrelationId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, reason = "Unit tests use expect/unwrap for setup clarity.")]

    use super::*;

    #[test]
    fn execution_id_roundtrips_through_json() {
        let id = ExecutionId::new("p1");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"p1\"");
        let restored: ExecutionId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, restored);
    }

    #[test]
    fn execution_id_display_matches_as_str() {
        let id = ExecutionId::new("p1");
        assert_eq!(id.to_string(), id.as_str());
    }

    #[test]
    fn execution_id_from_str_and_string_agree() {
        assert_eq!(ExecutionId::from("p1"), ExecutionId::from("p1".to_string()));
    }

    #[test]
    fn stage_ref_id_equality_is_opaque_string_equality() {
        assert_eq!(StageRefId::new("a"), StageRefId::new("a"));
        assert_ne!(StageRefId::new("a"), StageRefId::new("b"));
    }
}
