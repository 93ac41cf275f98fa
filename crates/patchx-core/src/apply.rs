//! Patch applier
//!
//! This module provides `apply()`, the only code path that mutates a
//! [`ConfigStore`], and `plan()`, its read-only twin used for dry runs.
//!
//! ## Atomicity Contract
//!
//! The eligible changes of one document form a single unit:
//! - **All-or-nothing**: either every eligible change is written, or the store
//!   is returned to the state it had before `apply()` started
//! - **Journaled**: each write records how to undo it; on rejection the journal
//!   is replayed in reverse
//! - **No panics**: a rejected write surfaces as `PatchError::ApplyAborted`
//!   carrying the partial result for diagnostics
//!
//! ## Example
//!
//! ```
//! use patchx_core::model::{ParamChange, PatchDocument, DEFAULT_PROJECT};
//! use patchx_core::ops::{ConfigStore, InMemoryStore};
//! use patchx_core::{apply, validate};
//!
//! let mut store = InMemoryStore::with_params([("Current Minecraft Version", "1.20")]);
//! let document = PatchDocument::new(
//!     DEFAULT_PROJECT,
//!     vec![ParamChange::new("Current Minecraft Version", "1.20", "main")],
//!     vec![],
//! )
//! .unwrap();
//!
//! let report = validate(&store, &document).unwrap();
//! let result = apply(&mut store, &document, &report).unwrap();
//!
//! assert_eq!(result.applied_changes[0].old_value, "1.20");
//! assert_eq!(store.get("Current Minecraft Version").unwrap().as_deref(), Some("main"));
//! ```

use crate::errors::{PatchError, Result};
use crate::model::{
    AppliedChange, ApplyResult, FeatureAction, FeatureChange, FeatureOutcome, FeatureRecord,
    PatchDocument, SkippedChange,
};
use crate::ops::ConfigStore;
use crate::rules::{FeatureTarget, ParamVerdict, ValidationReport};

/// A single write the applier intends to perform
#[derive(Debug)]
enum Step<'a> {
    SetParam {
        key: &'a str,
        expected: &'a str,
        new_value: &'a str,
    },
    PutFeature {
        record: FeatureRecord,
        previous: Option<FeatureRecord>,
        outcome: FeatureOutcome,
    },
}

/// How to restore the store after a write
enum Undo {
    Param {
        key: String,
        old_value: String,
    },
    Feature {
        id: String,
        previous: Option<FeatureRecord>,
    },
}

impl Undo {
    /// Parameter key or feature id; the only part of an undo that is logged
    fn target(&self) -> &str {
        match self {
            Undo::Param { key, .. } => key,
            Undo::Feature { id, .. } => id,
        }
    }
}

/// Apply every eligible change of `document` to `store`
///
/// Parameter overwrites run first, in document order, followed by feature
/// changes in document order.
///
/// # Errors
///
/// * `ApplyAborted` - the store rejected a write; earlier writes were undone
/// * `ReportMismatch` - `report` was produced for a different document
pub fn apply(
    store: &mut dyn ConfigStore,
    document: &PatchDocument,
    report: &ValidationReport,
) -> Result<ApplyResult> {
    let (steps, skipped) = build_steps(document, report)?;
    let mut result = ApplyResult {
        skipped,
        ..ApplyResult::default()
    };
    let mut journal = Vec::with_capacity(steps.len());

    for step in steps {
        if let Err((key, reason)) = execute(store, step, &mut result, &mut journal) {
            tracing::debug!(param_key = %key, %reason, "write rejected, rolling back");
            let rolled_back = rollback(store, journal);
            return Err(PatchError::ApplyAborted {
                key,
                reason,
                partial: Box::new(result),
                rolled_back,
            });
        }
    }

    Ok(result)
}

/// Compute the result `apply()` would produce, without touching the store
///
/// # Errors
///
/// * `ReportMismatch` - `report` was produced for a different document
pub fn plan(document: &PatchDocument, report: &ValidationReport) -> Result<ApplyResult> {
    let (steps, skipped) = build_steps(document, report)?;
    let mut result = ApplyResult {
        skipped,
        ..ApplyResult::default()
    };
    for step in steps {
        match step {
            Step::SetParam {
                key,
                expected,
                new_value,
            } => result.applied_changes.push(AppliedChange {
                key: key.to_string(),
                old_value: expected.to_string(),
                new_value: new_value.to_string(),
            }),
            Step::PutFeature { outcome, .. } => result.feature_changes.push(outcome),
        }
    }
    Ok(result)
}

fn build_steps<'a>(
    document: &'a PatchDocument,
    report: &ValidationReport,
) -> Result<(Vec<Step<'a>>, Vec<SkippedChange>)> {
    check_alignment(document, report)?;

    let mut steps = Vec::new();
    let mut skipped = Vec::new();

    for (change, check) in document.params().iter().zip(&report.params) {
        match &check.verdict {
            ParamVerdict::Eligible => steps.push(Step::SetParam {
                key: &change.key,
                expected: &change.expected_value,
                new_value: &change.new_value,
            }),
            ParamVerdict::Skipped { reason, actual } => skipped.push(SkippedChange {
                key: change.key.clone(),
                reason: *reason,
                expected: change.expected_value.clone(),
                actual: actual.clone(),
            }),
        }
    }

    for (change, check) in document.features().iter().zip(&report.features) {
        steps.push(feature_step(change, &check.target));
    }

    Ok((steps, skipped))
}

fn feature_step<'a>(change: &FeatureChange, target: &FeatureTarget) -> Step<'a> {
    match target {
        FeatureTarget::Create { replaces } => {
            let record = FeatureRecord {
                id: change.feature_id.clone(),
                feature_type: change.feature_type.clone().unwrap_or_default(),
                fields: change.desired_field_values.clone(),
            };
            let action = if replaces.as_ref() == Some(&record) {
                FeatureAction::Unchanged
            } else {
                FeatureAction::Created
            };
            let changed_fields = match action {
                FeatureAction::Unchanged => Vec::new(),
                _ => record.fields.keys().cloned().collect(),
            };
            Step::PutFeature {
                outcome: FeatureOutcome {
                    feature_id: change.feature_id.clone(),
                    action,
                    changed_fields,
                },
                previous: replaces.clone(),
                record,
            }
        }
        FeatureTarget::Update { existing } => {
            let (record, changed_fields) = existing.merged_with(&change.desired_field_values);
            let action = if changed_fields.is_empty() {
                FeatureAction::Unchanged
            } else {
                FeatureAction::Updated
            };
            Step::PutFeature {
                outcome: FeatureOutcome {
                    feature_id: change.feature_id.clone(),
                    action,
                    changed_fields,
                },
                previous: Some(existing.clone()),
                record,
            }
        }
    }
}

fn check_alignment(document: &PatchDocument, report: &ValidationReport) -> Result<()> {
    let params_match = document.params().len() == report.params.len()
        && document
            .params()
            .iter()
            .zip(&report.params)
            .all(|(c, r)| c.key == r.key);
    if !params_match {
        return Err(PatchError::ReportMismatch {
            reason: "parameter entries differ".to_string(),
        });
    }

    let features_match = document.features().len() == report.features.len()
        && document
            .features()
            .iter()
            .zip(&report.features)
            .all(|(c, r)| c.feature_id == r.feature_id);
    if !features_match {
        return Err(PatchError::ReportMismatch {
            reason: "feature entries differ".to_string(),
        });
    }

    Ok(())
}

/// Perform one step; on failure return the offending key and reason
fn execute(
    store: &mut dyn ConfigStore,
    step: Step<'_>,
    result: &mut ApplyResult,
    journal: &mut Vec<Undo>,
) -> std::result::Result<(), (String, String)> {
    match step {
        Step::SetParam {
            key,
            expected,
            new_value,
        } => {
            let old_value = store
                .get(key)
                .map_err(|e| (key.to_string(), e.to_string()))?;
            // Exclusive access makes this unreachable for well-behaved hosts.
            if old_value.as_deref() != Some(expected) {
                return Err((
                    key.to_string(),
                    "value changed between validation and apply".to_string(),
                ));
            }
            store
                .set(key, new_value)
                .map_err(|e| (key.to_string(), e.to_string()))?;
            journal.push(Undo::Param {
                key: key.to_string(),
                old_value: expected.to_string(),
            });
            result.applied_changes.push(AppliedChange {
                key: key.to_string(),
                old_value: expected.to_string(),
                new_value: new_value.to_string(),
            });
        }
        Step::PutFeature {
            record,
            previous,
            outcome,
        } => {
            if outcome.action != FeatureAction::Unchanged {
                store
                    .upsert_feature(&record)
                    .map_err(|e| (record.id.clone(), e.to_string()))?;
                journal.push(Undo::Feature {
                    id: record.id.clone(),
                    previous,
                });
            }
            result.feature_changes.push(outcome);
        }
    }
    Ok(())
}

/// Replay the journal in reverse; false if any compensating write failed
fn rollback(store: &mut dyn ConfigStore, journal: Vec<Undo>) -> bool {
    let mut clean = true;
    for undo in journal.into_iter().rev() {
        let outcome = match &undo {
            Undo::Param { key, old_value } => store.set(key, old_value),
            Undo::Feature {
                previous: Some(record),
                ..
            } => store.upsert_feature(record),
            Undo::Feature { id, previous: None } => store.remove_feature(id),
        };
        if let Err(err) = outcome {
            tracing::warn!(target_key = %undo.target(), %err, "rollback write failed");
            clean = false;
        }
    }
    clean
}
