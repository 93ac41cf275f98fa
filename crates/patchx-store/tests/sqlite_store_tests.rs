//! SqliteConfigStore tests: persistence across opens and the validate/apply
//! pipeline running against a real database

#![allow(clippy::unwrap_used, clippy::expect_used)]

use patchx_core::model::FeatureRecord;
use patchx_core::{apply, validate, ConfigStore, PatchError};
use patchx_store::{load, SqliteConfigStore};
use tempfile::TempDir;

const PATCH: &str = r#"
schema_version: 0
params:
  - key: Current Minecraft Version
    expect: "1.20"
    update: main
  - key: Release Branch
    expect: release/1.20
    update: main
features:
  - id: PROJECT_EXT_22
    type: GitHubIssueTracker
    mode: find
    fields:
      authType: accessToken
      secureToken: env:STRUCTURIZE_GITHUB_TOKEN
"#;

fn seeded(dir: &TempDir) -> SqliteConfigStore {
    let store = SqliteConfigStore::open(dir.path().join("nested").join("store.db")).unwrap();
    store.put_param("Current Minecraft Version", "1.20").unwrap();
    store.put_param("Release Branch", "release/1.20").unwrap();
    store
        .put_feature(
            &FeatureRecord::new("PROJECT_EXT_22", "GitHubIssueTracker")
                .with_field("displayName", "ldtteam/structurize")
                .with_field("authType", "anonymous"),
        )
        .unwrap();
    store
}

#[test]
fn test_state_survives_reopen() {
    // Given: a store seeded on disk
    let dir = TempDir::new().unwrap();
    drop(seeded(&dir));

    // When: it is reopened
    let store = SqliteConfigStore::open(dir.path().join("nested").join("store.db")).unwrap();

    // Then: params and features are read back, migrations are not re-run
    assert_eq!(
        store.list_params().unwrap(),
        vec![
            ("Current Minecraft Version".to_string(), "1.20".to_string()),
            ("Release Branch".to_string(), "release/1.20".to_string()),
        ]
    );
    assert_eq!(store.list_features().unwrap()[0].fields["authType"], "anonymous");
}

#[test]
fn test_apply_persists_to_disk() {
    let dir = TempDir::new().unwrap();
    let mut store = seeded(&dir);
    let document = load(PATCH).unwrap();

    let report = validate(&store, &document).unwrap();
    let result = apply(&mut store, &document, &report).unwrap();
    drop(store);

    assert_eq!(
        result.applied_keys(),
        vec!["Current Minecraft Version", "Release Branch"]
    );
    let store = SqliteConfigStore::open(dir.path().join("nested").join("store.db")).unwrap();
    assert_eq!(
        store.get("Current Minecraft Version").unwrap().as_deref(),
        Some("main")
    );
    let tracker = &store.list_features().unwrap()[0];
    assert_eq!(tracker.fields["authType"], "accessToken");
    assert_eq!(tracker.fields["displayName"], "ldtteam/structurize");
    assert_eq!(tracker.fields["secureToken"], "env:STRUCTURIZE_GITHUB_TOKEN");
}

#[test]
fn test_locked_feature_aborts_and_restores() {
    // Given: the issue tracker is locked by the host
    let dir = TempDir::new().unwrap();
    let mut store = seeded(&dir);
    store.set_locked("PROJECT_EXT_22", true).unwrap();
    let params_before = store.list_params().unwrap();
    let features_before = store.list_features().unwrap();
    let document = load(PATCH).unwrap();

    // When: the patch is applied
    let report = validate(&store, &document).unwrap();
    let err = apply(&mut store, &document, &report).unwrap_err();

    // Then: the run aborts on the feature and both params are restored
    assert!(matches!(err, PatchError::ApplyAborted { ref key, .. } if key == "PROJECT_EXT_22"));
    assert_eq!(store.list_params().unwrap(), params_before);
    assert_eq!(store.list_features().unwrap(), features_before);
}

#[test]
fn test_set_locked_unknown_key() {
    let store = SqliteConfigStore::open_in_memory().unwrap();
    assert!(!store.set_locked("nope", true).unwrap());
}
