//! Apply Atomicity Tests
//!
//! This test suite verifies the all-or-nothing guarantees of validate + apply.
//!
//! ## Scenarios Covered
//!
//! 1. Matching expectations are applied in document order
//! 2. Mismatched and missing keys are skipped, store untouched
//! 3. Re-applying an already applied patch is a net no-op
//! 4. A rejected write leaves no key of the document mutated
//! 5. A value that drifts between validate and apply aborts the run
//! 6. A failed compensating write is reported and never leaks field values

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{
    feature_change, issue_tracker, params_doc, structurize_store, WriteBudgetStore, MC_VERSION,
};
use patchx_core::logging_facility::init_test_capture;
use patchx_core::model::{
    FeatureAction, FeatureMode, ParamChange, PatchDocument, SkipReason, DEFAULT_PROJECT,
};
use patchx_core::{apply, validate, ConfigStore, FeatureRecord, InMemoryStore, PatchError};

#[test]
fn test_matching_version_is_updated() {
    // GIVEN the store records version 1.20
    let mut store = InMemoryStore::with_params([(MC_VERSION, "1.20")]);
    let document = params_doc(&[(MC_VERSION, "1.20", "main")]);

    // WHEN the patch is validated and applied
    let report = validate(&store, &document).unwrap();
    let result = apply(&mut store, &document, &report).unwrap();

    // THEN the change is reported with its old value and the store holds the new one
    assert_eq!(result.applied_changes.len(), 1);
    assert_eq!(result.applied_changes[0].key, MC_VERSION);
    assert_eq!(result.applied_changes[0].old_value, "1.20");
    assert_eq!(result.applied_changes[0].new_value, "main");
    assert!(result.skipped.is_empty());
    assert_eq!(store.get(MC_VERSION).unwrap().as_deref(), Some("main"));
}

#[test]
fn test_stale_expectation_is_skipped() {
    // GIVEN the store records version 1.19
    let mut store = InMemoryStore::with_params([(MC_VERSION, "1.19")]);
    let document = params_doc(&[(MC_VERSION, "1.20", "main")]);

    let report = validate(&store, &document).unwrap();
    let result = apply(&mut store, &document, &report).unwrap();

    // THEN the change is skipped and nothing is written
    assert!(result.applied_changes.is_empty());
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].key, MC_VERSION);
    assert_eq!(result.skipped[0].reason, SkipReason::ExpectationMismatch);
    assert_eq!(result.skipped[0].actual.as_deref(), Some("1.19"));
    assert_eq!(store.get(MC_VERSION).unwrap().as_deref(), Some("1.19"));
}

#[test]
fn test_missing_key_is_skipped_not_created() {
    let mut store = InMemoryStore::new();
    let document = params_doc(&[(MC_VERSION, "1.20", "main")]);

    let report = validate(&store, &document).unwrap();
    let result = apply(&mut store, &document, &report).unwrap();

    assert_eq!(result.skipped[0].reason, SkipReason::NotPresent);
    assert_eq!(store.get(MC_VERSION).unwrap(), None);
}

#[test]
fn test_applied_keys_follow_document_order() {
    let mut store = InMemoryStore::with_params([("b", "1"), ("a", "1"), ("c", "1")]);
    let document = params_doc(&[("c", "1", "3"), ("a", "1", "2"), ("b", "1", "4")]);

    let report = validate(&store, &document).unwrap();
    let result = apply(&mut store, &document, &report).unwrap();

    assert_eq!(result.applied_keys(), vec!["c", "a", "b"]);
}

#[test]
fn test_reapply_with_updated_expectation_is_noop() {
    // GIVEN a store the patch has already been applied to
    let mut store = InMemoryStore::with_params([(MC_VERSION, "1.20")]);
    let first = params_doc(&[(MC_VERSION, "1.20", "main")]);
    let report = validate(&store, &first).unwrap();
    apply(&mut store, &first, &report).unwrap();
    let after_first = store.clone();

    // WHEN the expectation names the value the first run wrote
    let second = params_doc(&[(MC_VERSION, "main", "main")]);
    let report = validate(&store, &second).unwrap();
    let result = apply(&mut store, &second, &report).unwrap();

    // THEN the run succeeds and nothing changes
    assert_eq!(result.applied_keys(), vec![MC_VERSION]);
    assert!(result.is_noop());
    assert_eq!(store, after_first);
}

#[test]
fn test_rejected_key_mutates_nothing() {
    // GIVEN three eligible keys, the last of which the store refuses
    let mut store = InMemoryStore::with_params([("a", "1"), ("b", "1"), ("c", "1")]);
    store.lock_key("c");
    let original = store.clone();
    let document = params_doc(&[("a", "1", "2"), ("b", "1", "2"), ("c", "1", "2")]);

    let report = validate(&store, &document).unwrap();
    let err = apply(&mut store, &document, &report).unwrap_err();

    // THEN the run aborts at the rejected key with the partial result attached
    match err {
        PatchError::ApplyAborted {
            key,
            partial,
            rolled_back,
            ..
        } => {
            assert_eq!(key, "c");
            assert!(rolled_back);
            assert_eq!(partial.applied_keys(), vec!["a", "b"]);
        }
        other => panic!("expected ApplyAborted, got {:?}", other),
    }

    // AND no key of the document was mutated
    assert_eq!(store, original);
}

#[test]
fn test_feature_rejection_rolls_back_params() {
    let mut store = structurize_store();
    store.lock_key("PROJECT_EXT_22");
    let original = store.clone();
    let document = PatchDocument::new(
        DEFAULT_PROJECT,
        vec![ParamChange::new(MC_VERSION, "1.20", "main")],
        vec![issue_tracker(
            FeatureMode::Find,
            &[
                ("authType", "accessToken"),
                ("accessToken", "env:GITHUB_TOKEN"),
            ],
        )],
    )
    .unwrap();

    let report = validate(&store, &document).unwrap();
    let err = apply(&mut store, &document, &report).unwrap_err();

    assert!(matches!(err, PatchError::ApplyAborted { ref key, .. } if key == "PROJECT_EXT_22"));
    assert_eq!(store, original);
}

#[test]
fn test_create_then_find_in_later_run() {
    // GIVEN a project with no issue tracker
    let mut store = InMemoryStore::new();
    let create = PatchDocument::new(
        DEFAULT_PROJECT,
        vec![],
        vec![issue_tracker(
            FeatureMode::Create,
            &[
                ("displayName", "ldtteam/structurize"),
                ("authType", "anonymous"),
            ],
        )],
    )
    .unwrap();
    let report = validate(&store, &create).unwrap();
    let result = apply(&mut store, &create, &report).unwrap();
    assert_eq!(result.feature_changes[0].action, FeatureAction::Created);

    // WHEN a later patch finds it and switches auth
    let update = PatchDocument::new(
        DEFAULT_PROJECT,
        vec![],
        vec![issue_tracker(FeatureMode::Find, &[("authType", "accessToken")])],
    )
    .unwrap();
    let report = validate(&store, &update).unwrap();
    let result = apply(&mut store, &update, &report).unwrap();

    // THEN only the listed field changed
    assert_eq!(result.feature_changes[0].action, FeatureAction::Updated);
    assert_eq!(result.feature_changes[0].changed_fields, vec!["authType"]);
    let record = &store.features()[0];
    assert_eq!(record.fields["authType"], "accessToken");
    assert_eq!(record.fields["displayName"], "ldtteam/structurize");
}

#[test]
fn test_feature_not_found_stops_before_apply() {
    let store = InMemoryStore::with_params([(MC_VERSION, "1.20")]);
    let document = PatchDocument::new(
        DEFAULT_PROJECT,
        vec![ParamChange::new(MC_VERSION, "1.20", "main")],
        vec![issue_tracker(FeatureMode::Find, &[("authType", "accessToken")])],
    )
    .unwrap();

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
fn test_find_by_type_updates_only_the_selected_record() {
    // GIVEN a tracker id first registered as YouTrack, then re-registered for GitHub
    let mut store = InMemoryStore::new();
    store.insert_feature(
        FeatureRecord::new("PROJECT_EXT_22", "YouTrack").with_field("host", "yt.example.org"),
    );
    store.insert_feature(
        FeatureRecord::new("PROJECT_EXT_22", "GitHubIssueTracker")
            .with_field("displayName", "ldtteam/structurize"),
    );
    store.insert_feature(FeatureRecord::new("PROJECT_EXT_23", "YouTrack").with_field("host", "yt.example.org"));
    let document = PatchDocument::new(
        DEFAULT_PROJECT,
        vec![],
        vec![issue_tracker(FeatureMode::Find, &[("authType", "accessToken")])],
    )
    .unwrap();

    // WHEN the GitHub tracker is found by type and updated
    let report = validate(&store, &document).unwrap();
    apply(&mut store, &document, &report).unwrap();

    // THEN the GitHub record gained the field and kept its own
    let tracker = &store.features()[0];
    assert_eq!(store.features().len(), 2);
    assert_eq!(tracker.feature_type, "GitHubIssueTracker");
    assert_eq!(tracker.fields["authType"], "accessToken");
    assert_eq!(tracker.fields["displayName"], "ldtteam/structurize");
    assert!(!tracker.fields.contains_key("host"));

    // AND the unrelated record is untouched
    assert_eq!(store.features()[1].fields["host"], "yt.example.org");
    assert!(!store.features()[1].fields.contains_key("authType"));
}

#[test]
fn test_value_drifting_after_validation_aborts_and_restores() {
    // GIVEN a patch validated while both expectations held
    let mut store =
        InMemoryStore::with_params([("Release Branch", "release/1.20"), (MC_VERSION, "1.20")]);
    let document = params_doc(&[
        ("Release Branch", "release/1.20", "release/1.21"),
        (MC_VERSION, "1.20", "main"),
    ]);
    let report = validate(&store, &document).unwrap();

    // WHEN another writer changes the version before apply
    store.set(MC_VERSION, "1.21").unwrap();
    let before_apply = store.clone();
    let err = apply(&mut store, &document, &report).unwrap_err();

    // THEN the run aborts at the drifted key and the earlier write is undone
    match err {
        PatchError::ApplyAborted {
            key,
            reason,
            partial,
            rolled_back,
        } => {
            assert_eq!(key, MC_VERSION);
            assert!(reason.contains("changed between validation and apply"));
            assert_eq!(partial.applied_keys(), vec!["Release Branch"]);
            assert!(rolled_back);
        }
        other => panic!("expected ApplyAborted, got {:?}", other),
    }
    assert_eq!(store, before_apply);
    assert_eq!(store.get(MC_VERSION).unwrap().as_deref(), Some("1.21"));
}

#[test]
fn test_failed_compensating_write_is_reported_without_field_values() {
    let capture = init_test_capture();

    // GIVEN tracker A whose only permitted write is the forward one, and a locked tracker B
    let mut inner = InMemoryStore::new();
    inner.insert_feature(
        FeatureRecord::new("TRACKER_A", "GitHubIssueTracker")
            .with_field("accessToken", "credentialsJSON:tracker-a-previous-ref"),
    );
    inner.insert_feature(FeatureRecord::new("TRACKER_B", "GitHubIssueTracker"));
    let mut store = WriteBudgetStore::new(inner)
        .allow("TRACKER_A", 1)
        .allow("TRACKER_B", 0);
    let document = PatchDocument::new(
        DEFAULT_PROJECT,
        vec![],
        vec![
            feature_change(
                "TRACKER_A",
                "GitHubIssueTracker",
                FeatureMode::Find,
                &[("accessToken", "credentialsJSON:tracker-a-next-ref")],
            ),
            feature_change(
                "TRACKER_B",
                "GitHubIssueTracker",
                FeatureMode::Find,
                &[("authType", "accessToken")],
            ),
        ],
    )
    .unwrap();

    // WHEN B is rejected and restoring A is rejected too
    let report = validate(&store, &document).unwrap();
    let err = apply(&mut store, &document, &report).unwrap_err();

    // THEN the abort says the rollback was incomplete
    match err {
        PatchError::ApplyAborted {
            key, rolled_back, ..
        } => {
            assert_eq!(key, "TRACKER_B");
            assert!(!rolled_back);
        }
        other => panic!("expected ApplyAborted, got {:?}", other),
    }
    assert_eq!(
        store.inner.features()[0].fields["accessToken"],
        "credentialsJSON:tracker-a-next-ref"
    );

    // AND the rollback failure names the record without its field values
    let warning = capture
        .events()
        .into_iter()
        .find(|e| e.field("target_key") == Some("TRACKER_A"))
        .expect("rollback failure should be logged");
    assert!(warning.field("err").is_some());
    capture.assert_never_logged("tracker-a-previous-ref");
    capture.assert_never_logged("tracker-a-next-ref");
}
