//! PatchX Engine - Orchestration layer
//!
//! Drives one patch run through `Loaded -> Validated -> Applied | Aborted`,
//! owns boundary logging for the run and maps failures to exit codes.

pub mod commands;
pub mod outcome;
pub mod run;

pub use commands::engine_command::{apply_engine_command, EngineCommand};
pub use commands::patch_run::{patch_apply, patch_check, patch_plan};
pub use outcome::{
    exit_code, DocumentSummary, RunOutcome, EXIT_APPLY_ABORTED, EXIT_FAILURE,
    EXIT_FEATURE_NOT_FOUND, EXIT_OK, EXIT_PARSE_ERROR,
};
pub use run::{PatchRun, RunState};
