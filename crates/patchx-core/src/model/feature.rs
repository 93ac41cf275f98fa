use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A project feature as held by the config store
///
/// An issue-tracker link is the typical example: `feature_type` is
/// `GitHubIssueTracker` and `fields` carry `repositoryURL`, `authType`, etc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub id: String,
    pub feature_type: String,
    pub fields: BTreeMap<String, String>,
}

impl FeatureRecord {
    pub fn new(id: impl Into<String>, feature_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            feature_type: feature_type.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Overlay `desired` onto this record, returning the merged record and the
    /// names of fields whose value actually changed
    pub fn merged_with(&self, desired: &BTreeMap<String, String>) -> (FeatureRecord, Vec<String>) {
        let mut merged = self.clone();
        let mut changed = Vec::new();
        for (name, value) in desired {
            if merged.fields.get(name) != Some(value) {
                merged.fields.insert(name.clone(), value.clone());
                changed.push(name.clone());
            }
        }
        (merged, changed)
    }
}
