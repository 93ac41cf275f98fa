use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::Result;
use crate::rules::invariants;

/// Project a patch targets when the document does not name one
pub const DEFAULT_PROJECT: &str = "_Self";

/// "Expect `expected_value`, update to `new_value`" for one parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamChange {
    pub key: String,
    pub expected_value: String,
    pub new_value: String,
}

impl ParamChange {
    pub fn new(
        key: impl Into<String>,
        expected_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            expected_value: expected_value.into(),
            new_value: new_value.into(),
        }
    }
}

/// How a feature change locates its target record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureMode {
    /// The record must already exist; only listed fields are overwritten
    Find,
    /// A new record is inserted with exactly the listed fields
    Create,
}

/// Desired state of one project feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureChange {
    pub feature_id: String,
    /// Narrows a find selector; required when creating
    pub feature_type: Option<String>,
    pub mode: FeatureMode,
    pub desired_field_values: BTreeMap<String, String>,
}

impl FeatureChange {
    /// True if `record` satisfies this change's find selector
    pub fn selects(&self, record: &super::FeatureRecord) -> bool {
        record.id == self.feature_id
            && self
                .feature_type
                .as_deref()
                .map_or(true, |t| record.feature_type == t)
    }
}

/// A parsed, invariant-checked patch
///
/// Fields are private so a document cannot be altered once it has passed
/// the document invariants in [`invariants`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchDocument {
    project: String,
    params: Vec<ParamChange>,
    features: Vec<FeatureChange>,
}

impl PatchDocument {
    /// Build a document, enforcing key uniqueness, non-empty values and
    /// secret externalization
    ///
    /// # Errors
    ///
    /// Returns a parse-kind [`crate::PatchError`] describing the first violated
    /// invariant.
    pub fn new(
        project: impl Into<String>,
        params: Vec<ParamChange>,
        features: Vec<FeatureChange>,
    ) -> Result<Self> {
        invariants::check_params(&params)?;
        invariants::check_features(&features)?;
        Ok(Self {
            project: project.into(),
            params,
            features,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn params(&self) -> &[ParamChange] {
        &self.params
    }

    pub fn features(&self) -> &[FeatureChange] {
        &self.features
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.features.is_empty()
    }
}
