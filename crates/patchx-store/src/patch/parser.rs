//! Patch parser with validation
//!
//! Parses YAML, checks the schema version and builds a [`PatchDocument`],
//! which enforces the document invariants (non-empty values, unique keys and
//! ids, externalized secrets).

use crate::errors::{io_error, malformed, Result};
use crate::patch::format_v0::{FeatureEntryV0, ParamEntryV0, PatchV0, Scalar};
use patchx_core::errors::PatchError;
use patchx_core::model::{
    FeatureChange, FeatureMode, ParamChange, PatchDocument, DEFAULT_PROJECT,
};
use std::fs;
use std::path::Path;

/// Only schema version understood by this loader
pub const SCHEMA_VERSION: u32 = 0;

/// Parse a patch document from text
///
/// # Errors
///
/// A parse-kind [`PatchError`]: `Malformed` for invalid YAML or unknown
/// fields, `UnsupportedSchemaVersion`, or the first violated document
/// invariant.
pub fn load(text: &str) -> Result<PatchDocument> {
    let raw: PatchV0 =
        serde_yaml::from_str(text).map_err(|e| malformed(format!("YAML parse error: {}", e)))?;

    if raw.schema_version != SCHEMA_VERSION {
        return Err(PatchError::UnsupportedSchemaVersion {
            found: raw.schema_version,
        });
    }

    let params = raw.params.into_iter().map(param_change).collect();
    let features = raw
        .features
        .into_iter()
        .enumerate()
        .map(|(index, entry)| feature_change(index, entry))
        .collect::<Result<Vec<_>>>()?;

    let project = raw
        .project
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PROJECT.to_string());

    let document = PatchDocument::new(project, params, features)?;
    tracing::debug!(
        params = document.params().len(),
        features = document.features().len(),
        "patch document loaded"
    );
    Ok(document)
}

/// Read a patch file and parse it
///
/// # Errors
///
/// `Io` if the file cannot be read, otherwise the errors of [`load`].
pub fn load_file(path: &Path) -> Result<PatchDocument> {
    let text = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    load(&text)
}

fn text(value: Option<Scalar>) -> String {
    value.map(Scalar::into_string).unwrap_or_default()
}

fn param_change(entry: ParamEntryV0) -> ParamChange {
    ParamChange::new(text(entry.key), text(entry.expect), text(entry.update))
}

fn feature_change(index: usize, entry: FeatureEntryV0) -> Result<FeatureChange> {
    let feature_id = text(entry.id);
    let label = if feature_id.is_empty() {
        format!("features[{}]", index)
    } else {
        feature_id.clone()
    };

    let mode = match entry.mode.as_deref().map(str::trim) {
        Some("find") => FeatureMode::Find,
        Some("create") => FeatureMode::Create,
        Some(other) => {
            return Err(PatchError::InvalidFeatureMode {
                feature_id: label,
                reason: format!("mode must be 'find' or 'create', got '{}'", other),
            })
        }
        None => {
            return Err(PatchError::InvalidFeatureMode {
                feature_id: label,
                reason: "exactly one of find or create is required".to_string(),
            })
        }
    };

    Ok(FeatureChange {
        feature_id,
        feature_type: entry.feature_type.filter(|t| !t.trim().is_empty()),
        mode,
        desired_field_values: entry
            .fields
            .into_iter()
            .map(|(name, value)| (name, value.into_string()))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_valid_patch() {
        let yaml = r#"
schema_version: 0
params:
  - key: Current Minecraft Version
    expect: "1.20"
    update: main
"#;

        let document = load(yaml).unwrap();
        assert_eq!(document.project(), DEFAULT_PROJECT);
        assert_eq!(
            document.params(),
            &[ParamChange::new("Current Minecraft Version", "1.20", "main")]
        );
    }

    #[test]
    fn test_unsupported_schema_version() {
        let err = load("schema_version: 1\n").unwrap_err();
        assert_eq!(err, PatchError::UnsupportedSchemaVersion { found: 1 });
    }

    #[test]
    fn test_missing_mode_is_invalid() {
        let yaml = r#"
schema_version: 0
features:
  - id: PROJECT_EXT_22
    fields:
      authType: accessToken
"#;

        let err = load(yaml).unwrap_err();
        assert!(matches!(
            err,
            PatchError::InvalidFeatureMode { ref feature_id, .. } if feature_id == "PROJECT_EXT_22"
        ));
    }

    #[test]
    fn test_unknown_mode_is_invalid() {
        let yaml = r#"
schema_version: 0
features:
  - id: PROJECT_EXT_22
    type: GitHubIssueTracker
    mode: find-or-create
"#;

        assert!(matches!(
            load(yaml).unwrap_err(),
            PatchError::InvalidFeatureMode { .. }
        ));
    }

    #[test]
    fn test_blank_project_falls_back_to_default() {
        let document = load("schema_version: 0\nproject: \"\"\n").unwrap();
        assert_eq!(document.project(), DEFAULT_PROJECT);
        assert!(document.is_empty());
    }
}
