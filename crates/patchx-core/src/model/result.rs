//! Per-run outcome of applying a patch document.
//!
//! Only field *names* of feature changes are reported, never their values,
//! so a result can be logged or printed without leaking credential references.

use serde::{Deserialize, Serialize};

/// One parameter overwrite performed (or planned) by the applier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedChange {
    pub key: String,
    pub old_value: String,
    pub new_value: String,
}

/// Why a parameter change was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Store value differs from the declared expectation
    ExpectationMismatch,
    /// Key does not exist in the store
    NotPresent,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::ExpectationMismatch => f.write_str("ExpectationMismatch"),
            SkipReason::NotPresent => f.write_str("NotPresent"),
        }
    }
}

/// A parameter change left untouched, with enough context to diagnose it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedChange {
    pub key: String,
    pub reason: SkipReason,
    pub expected: String,
    /// Store value at validation time; `None` when the key is absent
    pub actual: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureAction {
    Created,
    Updated,
    /// Every desired field already held its value; no write was issued
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureOutcome {
    pub feature_id: String,
    pub action: FeatureAction,
    pub changed_fields: Vec<String>,
}

/// Result of one applier (or planner) invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Parameter overwrites, in document order
    pub applied_changes: Vec<AppliedChange>,
    /// Parameter changes whose expectation did not hold, in document order
    pub skipped: Vec<SkippedChange>,
    /// Feature changes, in document order
    pub feature_changes: Vec<FeatureOutcome>,
    /// SHA-256 of the canonical document, filled in by the run orchestrator
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub document_digest: Option<String>,
}

impl ApplyResult {
    /// True when the run changed nothing in the store
    pub fn is_noop(&self) -> bool {
        self.applied_changes
            .iter()
            .all(|c| c.old_value == c.new_value)
            && self
                .feature_changes
                .iter()
                .all(|f| f.action == FeatureAction::Unchanged)
    }

    pub fn applied_keys(&self) -> Vec<&str> {
        self.applied_changes.iter().map(|c| c.key.as_str()).collect()
    }
}
