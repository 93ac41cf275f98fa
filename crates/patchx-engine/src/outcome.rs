//! Run outcomes as reported to hosts, and the process exit code for each.

use crate::run::{PatchRun, RunState};
use patchx_core::errors::{ExErrorKind, PatchError};
use patchx_core::model::ApplyResult;
use serde::Serialize;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_PARSE_ERROR: i32 = 2;
pub const EXIT_FEATURE_NOT_FOUND: i32 = 3;
pub const EXIT_APPLY_ABORTED: i32 = 4;

/// Exit code a host process should return for `err`
pub fn exit_code(err: &PatchError) -> i32 {
    match err.kind() {
        ExErrorKind::Parse => EXIT_PARSE_ERROR,
        ExErrorKind::FeatureNotFound => EXIT_FEATURE_NOT_FOUND,
        ExErrorKind::ApplyAborted => EXIT_APPLY_ABORTED,
        ExErrorKind::Io
        | ExErrorKind::Persistence
        | ExErrorKind::Config
        | ExErrorKind::Internal => EXIT_FAILURE,
    }
}

/// A finished apply or plan
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    pub project: String,
    pub state: RunState,
    pub dry_run: bool,
    pub document_digest: String,
    pub result: ApplyResult,
}

impl RunOutcome {
    pub(crate) fn from_run(run: &PatchRun, result: ApplyResult, dry_run: bool) -> Self {
        let ctx = run.context();
        Self {
            run_id: ctx.run_id.to_string(),
            trace_id: ctx.trace_id.as_ref().map(|t| t.to_string()),
            project: run.document().project().to_string(),
            state: run.state(),
            dry_run,
            document_digest: run.digest().to_string(),
            result,
        }
    }
}

/// Shape of a loaded document, for checking patches before they reach a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub project: String,
    pub document_digest: String,
    pub param_count: usize,
    pub feature_count: usize,
    pub param_keys: Vec<String>,
    pub feature_ids: Vec<String>,
}

impl DocumentSummary {
    pub(crate) fn from_run(run: &PatchRun) -> Self {
        let document = run.document();
        Self {
            project: document.project().to_string(),
            document_digest: run.digest().to_string(),
            param_count: document.params().len(),
            feature_count: document.features().len(),
            param_keys: document.params().iter().map(|c| c.key.clone()).collect(),
            feature_ids: document
                .features()
                .iter()
                .map(|c| c.feature_id.clone())
                .collect(),
        }
    }
}
