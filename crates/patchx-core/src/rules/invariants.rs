//! Document-level invariants enforced when a [`PatchDocument`] is built.
//!
//! [`PatchDocument`]: crate::model::PatchDocument

use std::collections::HashSet;

use crate::errors::{PatchError, Result};
use crate::model::{is_secret_field, FeatureChange, FeatureMode, ParamChange, SecretRef};

/// Keys are non-empty and unique; expect/update values are non-empty
///
/// # Errors
///
/// `MissingField` for an empty key or value, `DuplicateKey` for a repeated key.
pub fn check_params(params: &[ParamChange]) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, change) in params.iter().enumerate() {
        if change.key.trim().is_empty() {
            return Err(PatchError::MissingField {
                entry: format!("params[{}]", index),
                field: "key".to_string(),
            });
        }
        if change.expected_value.is_empty() {
            return Err(PatchError::MissingField {
                entry: change.key.clone(),
                field: "expect".to_string(),
            });
        }
        if change.new_value.is_empty() {
            return Err(PatchError::MissingField {
                entry: change.key.clone(),
                field: "update".to_string(),
            });
        }
        if !seen.insert(change.key.as_str()) {
            return Err(PatchError::DuplicateKey {
                key: change.key.clone(),
            });
        }
    }
    Ok(())
}

/// Feature ids are non-empty and unique, create mode names a type, and
/// secret fields hold references
///
/// # Errors
///
/// `MissingField`, `DuplicateFeature`, `InvalidFeatureMode` or `InlineSecret`.
pub fn check_features(features: &[FeatureChange]) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, change) in features.iter().enumerate() {
        if change.feature_id.trim().is_empty() {
            return Err(PatchError::MissingField {
                entry: format!("features[{}]", index),
                field: "id".to_string(),
            });
        }
        if !seen.insert(change.feature_id.as_str()) {
            return Err(PatchError::DuplicateFeature {
                feature_id: change.feature_id.clone(),
            });
        }
        if change.mode == FeatureMode::Create
            && change
                .feature_type
                .as_deref()
                .map_or(true, |t| t.trim().is_empty())
        {
            return Err(PatchError::InvalidFeatureMode {
                feature_id: change.feature_id.clone(),
                reason: "create requires a feature type".to_string(),
            });
        }
        for (field, value) in &change.desired_field_values {
            if is_secret_field(field) && SecretRef::parse(value).is_none() {
                return Err(PatchError::InlineSecret {
                    feature_id: change.feature_id.clone(),
                    field: field.clone(),
                });
            }
        }
    }
    Ok(())
}
