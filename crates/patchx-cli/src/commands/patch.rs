//! Patch commands
//!
//! Usage:
//!   patchx apply <PATH> [--json] [--trace-id <ID>]
//!   patchx plan <PATH> [--json] [--trace-id <ID>]
//!   patchx validate <PATH> [--json]
//!
//! `<PATH>` may be `-` to read the patch from stdin.

use crate::config::Settings;
use clap::Args;
use patchx_core::errors::PatchError;
use patchx_core::model::FeatureAction;
use patchx_core_types::{RunContext, TraceId};
use patchx_engine::{apply_engine_command, DocumentSummary, EngineCommand, RunOutcome};
use patchx_store::SqliteConfigStore;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct PatchArgs {
    /// Patch document (YAML), or `-` for stdin
    pub path: PathBuf,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,

    /// Correlation id of the submitting build
    #[arg(long)]
    pub trace_id: Option<String>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Patch document (YAML), or `-` for stdin
    pub path: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum Mode {
    Apply,
    Plan,
}

fn read_patch(path: &Path) -> Result<String, PatchError> {
    let io_error = |e: std::io::Error| PatchError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    };
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).map_err(io_error)?;
        return Ok(text);
    }
    std::fs::read_to_string(path).map_err(io_error)
}

fn context(trace_id: Option<String>) -> RunContext {
    match trace_id {
        Some(id) => RunContext::new().with_trace_id(TraceId::from_string(id)),
        None => RunContext::new(),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), PatchError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| PatchError::Internal {
        message: format!("failed to render JSON: {}", e),
    })?;
    println!("{}", text);
    Ok(())
}

/// Execute apply or plan
pub fn execute(args: PatchArgs, mode: Mode, settings: &Settings) -> Result<(), PatchError> {
    let text = read_patch(&args.path)?;
    let mut store = SqliteConfigStore::open(&settings.store)?;
    let ctx = context(args.trace_id);

    let cmd = match mode {
        Mode::Apply => EngineCommand::Apply { text },
        Mode::Plan => EngineCommand::Plan { text },
    };
    let outcome = apply_engine_command(cmd, &mut store, &ctx)?;

    if args.json {
        print_json(&outcome)
    } else {
        print_outcome(&outcome);
        Ok(())
    }
}

/// Execute validate
pub fn execute_validate(args: ValidateArgs) -> Result<(), PatchError> {
    let text = read_patch(&args.path)?;
    let summary = patchx_engine::patch_check(&text, &RunContext::new())?;

    if args.json {
        print_json(&summary)
    } else {
        print_summary(&args.path, &summary);
        Ok(())
    }
}

fn print_outcome(outcome: &RunOutcome) {
    let verb = if outcome.dry_run { "Planned" } else { "Applied" };
    println!(
        "{} patch for project {} (run {})",
        verb, outcome.project, outcome.run_id
    );

    let result = &outcome.result;
    for change in &result.applied_changes {
        if change.old_value == change.new_value {
            println!("  = {}: {} (unchanged)", change.key, change.new_value);
        } else {
            println!(
                "  ~ {}: {} -> {}",
                change.key, change.old_value, change.new_value
            );
        }
    }
    for skip in &result.skipped {
        match &skip.actual {
            Some(actual) => println!(
                "  - {}: skipped, {} (expected {:?}, found {:?})",
                skip.key, skip.reason, skip.expected, actual
            ),
            None => println!("  - {}: skipped, {}", skip.key, skip.reason),
        }
    }
    for feature in &result.feature_changes {
        let action = match feature.action {
            FeatureAction::Created => "created",
            FeatureAction::Updated => "updated",
            FeatureAction::Unchanged => "unchanged",
        };
        if feature.changed_fields.is_empty() {
            println!("  * {}: {}", feature.feature_id, action);
        } else {
            println!(
                "  * {}: {} [{}]",
                feature.feature_id,
                action,
                feature.changed_fields.join(", ")
            );
        }
    }

    println!(
        "{} applied, {} skipped, {} feature(s); digest {}",
        result.applied_changes.len(),
        result.skipped.len(),
        result.feature_changes.len(),
        outcome.document_digest
    );
}

fn print_summary(path: &Path, summary: &DocumentSummary) {
    println!(
        "✓ {} is a valid patch for project {}",
        path.display(),
        summary.project
    );
    for key in &summary.param_keys {
        println!("  param   {}", key);
    }
    for id in &summary.feature_ids {
        println!("  feature {}", id);
    }
    println!("digest {}", summary.document_digest);
}
