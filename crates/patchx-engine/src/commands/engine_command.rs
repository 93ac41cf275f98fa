//! Engine-level commands, one per store-backed host entry point.

use crate::commands::patch_run::{patch_apply, patch_plan};
use crate::outcome::RunOutcome;
use patchx_core::errors::Result;
use patchx_core::ops::ConfigStore;
use patchx_core_types::RunContext;

/// Commands a host can issue with raw patch text.
///
/// Load-only checks need no store and go through
/// [`patch_check`](crate::patch_check) directly.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Load, validate and apply.
    Apply { text: String },
    /// Load and validate, then report the result without writing.
    Plan { text: String },
}

/// Dispatch an engine command against `store`.
///
/// # Errors
///
/// Whatever the dispatched handler returns.
pub fn apply_engine_command(
    cmd: EngineCommand,
    store: &mut dyn ConfigStore,
    ctx: &RunContext,
) -> Result<RunOutcome> {
    match cmd {
        EngineCommand::Apply { text } => patch_apply(&text, store, ctx),
        EngineCommand::Plan { text } => patch_plan(&text, store, ctx),
    }
}
