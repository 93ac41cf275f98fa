//! Patch run state machine
//!
//! A run moves `Loaded -> Validated -> Applied | Aborted` and never goes
//! back. There are no retries: a failed run is reported and a new run is
//! started from fresh patch text.

use patchx_core::errors::{PatchError, Result};
use patchx_core::model::{ApplyResult, PatchDocument};
use patchx_core::ops::{ConfigStore, StoreError};
use patchx_core::rules::ValidationReport;
use patchx_core_types::RunContext;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Loaded,
    Validated,
    Applied,
    Aborted,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunState::Loaded => "Loaded",
            RunState::Validated => "Validated",
            RunState::Applied => "Applied",
            RunState::Aborted => "Aborted",
        };
        f.write_str(name)
    }
}

/// One Load -> Validate -> Apply pass over one document
#[derive(Debug)]
pub struct PatchRun {
    ctx: RunContext,
    state: RunState,
    document: PatchDocument,
    digest: String,
    report: Option<ValidationReport>,
}

fn persistence(err: StoreError) -> PatchError {
    PatchError::Persistence {
        message: err.to_string(),
    }
}

impl PatchRun {
    /// Start a run for an already loaded document
    ///
    /// # Errors
    ///
    /// `Internal` if the document digest cannot be computed.
    pub fn new(ctx: RunContext, document: PatchDocument) -> Result<Self> {
        let digest = patchx_store::document_digest(&document)?;
        Ok(Self {
            ctx,
            state: RunState::Loaded,
            document,
            digest,
            report: None,
        })
    }

    /// Load patch text and start a run for it
    ///
    /// # Errors
    ///
    /// Any parse-kind error of the loader.
    pub fn from_text(ctx: RunContext, text: &str) -> Result<Self> {
        Self::new(ctx, patchx_store::load(text)?)
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn document(&self) -> &PatchDocument {
        &self.document
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        self.report.as_ref()
    }

    fn expect_state(&self, wanted: RunState, action: &str) -> Result<()> {
        if self.state != wanted {
            return Err(PatchError::Internal {
                message: format!("cannot {} a run in state {}", action, self.state),
            });
        }
        Ok(())
    }

    /// Check every expectation against `store`
    ///
    /// A `FeatureNotFound` aborts the run.
    ///
    /// # Errors
    ///
    /// `FeatureNotFound`, `Persistence`, or `Internal` if the run is not in
    /// `Loaded`.
    pub fn validate(&mut self, store: &dyn ConfigStore) -> Result<&ValidationReport> {
        self.expect_state(RunState::Loaded, "validate")?;
        match patchx_core::validate(store, &self.document) {
            Ok(report) => {
                self.state = RunState::Validated;
                Ok(&*self.report.insert(report))
            }
            Err(err) => {
                self.state = RunState::Aborted;
                Err(err)
            }
        }
    }

    /// Result the apply step would produce; the run stays `Validated`
    ///
    /// # Errors
    ///
    /// `Internal` if the run is not in `Validated`.
    pub fn plan(&self) -> Result<ApplyResult> {
        self.expect_state(RunState::Validated, "plan")?;
        let report = self.validated_report()?;
        let mut result = patchx_core::plan(&self.document, report)?;
        result.document_digest = Some(self.digest.clone());
        Ok(result)
    }

    /// Apply the validated changes inside one store unit of work
    ///
    /// # Errors
    ///
    /// `ApplyAborted` when the store rejected a write (the store is left as
    /// it was), `Persistence` if the unit of work cannot be opened or
    /// committed, `Internal` if the run is not in `Validated`.
    pub fn apply(&mut self, store: &mut dyn ConfigStore) -> Result<ApplyResult> {
        self.expect_state(RunState::Validated, "apply")?;
        let report = self.validated_report()?.clone();

        if let Err(err) = store.begin_run() {
            self.state = RunState::Aborted;
            return Err(persistence(err));
        }

        match patchx_core::apply(store, &self.document, &report) {
            Ok(mut result) => {
                if let Err(err) = store.end_run(true) {
                    self.state = RunState::Aborted;
                    return Err(persistence(err));
                }
                result.document_digest = Some(self.digest.clone());
                self.state = RunState::Applied;
                Ok(result)
            }
            Err(err) => {
                if let Err(end_err) = store.end_run(false) {
                    tracing::warn!(run_id = %self.ctx.run_id, %end_err, "store rollback failed");
                }
                self.state = RunState::Aborted;
                Err(err)
            }
        }
    }

    fn validated_report(&self) -> Result<&ValidationReport> {
        self.report.as_ref().ok_or_else(|| PatchError::Internal {
            message: "validated run has no report".to_string(),
        })
    }
}
