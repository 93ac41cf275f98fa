use crate::errors::{PatchError, Result};
use crate::model::{FeatureMode, FeatureRecord, PatchDocument, SkipReason};
use crate::ops::{ConfigStore, StoreError};

/// Outcome of checking one parameter expectation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamVerdict {
    /// Precondition held; safe to apply
    Eligible,
    Skipped {
        reason: SkipReason,
        actual: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamCheck {
    pub key: String,
    pub verdict: ParamVerdict,
}

/// Where a feature change will land
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureTarget {
    /// Insert a new record; `replaces` holds a same-id record already present
    Create { replaces: Option<FeatureRecord> },
    /// Overlay desired fields onto the first record matching the selector
    Update { existing: FeatureRecord },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureCheck {
    pub feature_id: String,
    pub target: FeatureTarget,
}

/// Per-entry verdicts for one document against one store state
///
/// Entries are in document order, one per change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub params: Vec<ParamCheck>,
    pub features: Vec<FeatureCheck>,
}

impl ValidationReport {
    pub fn eligible_count(&self) -> usize {
        self.params
            .iter()
            .filter(|c| c.verdict == ParamVerdict::Eligible)
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.params.len() - self.eligible_count()
    }
}

/// Check every change of `document` against the current `store` state
///
/// Read-only. A missing key or a differing value is a skip, not an error.
///
/// # Errors
///
/// * `FeatureNotFound` - a find-mode selector matches no feature record
/// * `Persistence` - the store could not be read
pub fn validate(store: &dyn ConfigStore, document: &PatchDocument) -> Result<ValidationReport> {
    let mut params = Vec::with_capacity(document.params().len());
    for change in document.params() {
        let actual = store.get(&change.key).map_err(backend_error)?;
        let verdict = match actual {
            None => ParamVerdict::Skipped {
                reason: SkipReason::NotPresent,
                actual: None,
            },
            Some(value) if value == change.expected_value => ParamVerdict::Eligible,
            Some(value) => ParamVerdict::Skipped {
                reason: SkipReason::ExpectationMismatch,
                actual: Some(value),
            },
        };
        tracing::debug!(param_key = %change.key, ?verdict, "checked expectation");
        params.push(ParamCheck {
            key: change.key.clone(),
            verdict,
        });
    }

    let mut features = Vec::with_capacity(document.features().len());
    if !document.features().is_empty() {
        let records = store.list_features().map_err(backend_error)?;
        for change in document.features() {
            let target = match change.mode {
                FeatureMode::Create => FeatureTarget::Create {
                    replaces: records.iter().find(|r| r.id == change.feature_id).cloned(),
                },
                // Ids are unique within a store, so at most one record qualifies.
                FeatureMode::Find => match records.iter().find(|r| change.selects(r)) {
                    Some(existing) => FeatureTarget::Update {
                        existing: existing.clone(),
                    },
                    None => {
                        return Err(PatchError::FeatureNotFound {
                            feature_id: change.feature_id.clone(),
                            feature_type: change.feature_type.clone(),
                        })
                    }
                },
            };
            features.push(FeatureCheck {
                feature_id: change.feature_id.clone(),
                target,
            });
        }
    }

    Ok(ValidationReport { params, features })
}

fn backend_error(err: StoreError) -> PatchError {
    PatchError::Persistence {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FeatureChange, ParamChange, DEFAULT_PROJECT};
    use crate::ops::InMemoryStore;
    use std::collections::BTreeMap;

    fn doc(params: Vec<ParamChange>, features: Vec<FeatureChange>) -> PatchDocument {
        PatchDocument::new(DEFAULT_PROJECT, params, features).unwrap()
    }

    fn find(id: &str, feature_type: Option<&str>) -> FeatureChange {
        FeatureChange {
            feature_id: id.to_string(),
            feature_type: feature_type.map(str::to_string),
            mode: FeatureMode::Find,
            desired_field_values: BTreeMap::new(),
        }
    }

    #[test]
    fn test_matching_value_is_eligible() {
        let store = InMemoryStore::with_params([("Current Minecraft Version", "1.20")]);
        let document = doc(
            vec![ParamChange::new("Current Minecraft Version", "1.20", "main")],
            vec![],
        );

        let report = validate(&store, &document).unwrap();

        assert_eq!(report.params[0].verdict, ParamVerdict::Eligible);
        assert_eq!(report.eligible_count(), 1);
    }

    #[test]
    fn test_mismatch_and_missing_are_skips() {
        let store = InMemoryStore::with_params([("Current Minecraft Version", "1.19")]);
        let document = doc(
            vec![
                ParamChange::new("Current Minecraft Version", "1.20", "main"),
                ParamChange::new("Release Branch", "release/1.20", "main"),
            ],
            vec![],
        );

        let report = validate(&store, &document).unwrap();

        assert_eq!(
            report.params[0].verdict,
            ParamVerdict::Skipped {
                reason: SkipReason::ExpectationMismatch,
                actual: Some("1.19".to_string())
            }
        );
        assert_eq!(
            report.params[1].verdict,
            ParamVerdict::Skipped {
                reason: SkipReason::NotPresent,
                actual: None
            }
        );
        assert_eq!(report.skipped_count(), 2);
    }

    #[test]
    fn test_find_without_match_fails() {
        let store = InMemoryStore::new();
        let document = doc(vec![], vec![find("PROJECT_EXT_22", Some("GitHubIssueTracker"))]);

        let err = validate(&store, &document).unwrap_err();

        assert_eq!(
            err,
            PatchError::FeatureNotFound {
                feature_id: "PROJECT_EXT_22".to_string(),
                feature_type: Some("GitHubIssueTracker".to_string()),
            }
        );
    }

    #[test]
    fn test_find_selects_record_by_id() {
        let mut store = InMemoryStore::new();
        store.insert_feature(FeatureRecord::new("PROJECT_EXT_21", "GitHubIssueTracker").with_field("n", "other"));
        store.insert_feature(FeatureRecord::new("PROJECT_EXT_22", "GitHubIssueTracker").with_field("n", "target"));
        let document = doc(vec![], vec![find("PROJECT_EXT_22", None)]);

        let report = validate(&store, &document).unwrap();

        match &report.features[0].target {
            FeatureTarget::Update { existing } => {
                assert_eq!(existing.id, "PROJECT_EXT_22");
                assert_eq!(existing.fields["n"], "target");
            }
            other => panic!("expected update target, got {:?}", other),
        }
    }

    #[test]
    fn test_find_type_must_match_the_stored_record() {
        let mut store = InMemoryStore::new();
        store.insert_feature(FeatureRecord::new("PROJECT_EXT_22", "YouTrack"));
        let document = doc(vec![], vec![find("PROJECT_EXT_22", Some("GitHubIssueTracker"))]);

        let err = validate(&store, &document).unwrap_err();

        assert!(matches!(err, PatchError::FeatureNotFound { .. }));
    }

    #[test]
    fn test_create_never_fails() {
        let store = InMemoryStore::new();
        let mut change = find("PROJECT_EXT_23", Some("GitHubIssueTracker"));
        change.mode = FeatureMode::Create;
        let document = doc(vec![], vec![change]);

        let report = validate(&store, &document).unwrap();

        assert_eq!(
            report.features[0].target,
            FeatureTarget::Create { replaces: None }
        );
    }
}
