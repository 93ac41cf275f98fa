//! Patch run command handlers with boundary logging.
//!
//! This module provides the entry points hosts call with raw patch text:
//! - `patch_apply`: load, validate and apply
//! - `patch_plan`: load, validate and compute the result without writing
//! - `patch_check`: load only, no store involved
//!
//! ## Logging Ownership
//!
//! The engine layer owns lifecycle logging for patch runs:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Every event is emitted inside a `patch_run` span carrying `run_id` and,
//! when supplied, `trace_id`. Lower layers (store, core) use only
//! `tracing::debug!()` for internal details.

use crate::outcome::{DocumentSummary, RunOutcome};
use crate::run::PatchRun;
use patchx_core::errors::Result;
use patchx_core::model::{is_secret_field, PatchDocument};
use patchx_core::ops::ConfigStore;
use patchx_core::{log_op_end, log_op_error, log_op_start};
use patchx_core_types::{RunContext, Sensitive};
use std::time::Instant;

fn run_span(ctx: &RunContext) -> tracing::Span {
    tracing::info_span!(
        "patch_run",
        run_id = %ctx.run_id,
        trace_id = ctx.trace_id.as_ref().map(|t| t.as_str()),
    )
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Debug-log what a document will touch; secret field values stay redacted
fn trace_document(document: &PatchDocument) {
    for change in document.params() {
        tracing::debug!(
            param_key = %change.key,
            expect = %change.expected_value,
            update = %change.new_value,
            "param change"
        );
    }
    for change in document.features() {
        for (field, value) in &change.desired_field_values {
            if is_secret_field(field) {
                tracing::debug!(
                    feature_id = %change.feature_id,
                    field = %field,
                    value = %Sensitive::new(value),
                    "feature field"
                );
            } else {
                tracing::debug!(
                    feature_id = %change.feature_id,
                    field = %field,
                    value = %value,
                    "feature field"
                );
            }
        }
    }
}

/// Load, validate and apply `text` against `store`
///
/// ## Errors
///
/// - Parse-kind errors from the loader
/// - `FeatureNotFound`: a find selector matched nothing; the store is untouched
/// - `ApplyAborted`: the store rejected a write; the store is left unchanged
/// - `Persistence`: the store failed outside of a rejected write
pub fn patch_apply(
    text: &str,
    store: &mut dyn ConfigStore,
    ctx: &RunContext,
) -> Result<RunOutcome> {
    let span = run_span(ctx);
    let _enter = span.enter();
    log_op_start!("patch_apply");
    let start = Instant::now();

    let outcome = patch_apply_impl(text, store, ctx).map_err(|e| {
        log_op_error!("patch_apply", e.clone(), duration_ms = elapsed_ms(start));
        e
    })?;

    log_op_end!(
        "patch_apply",
        duration_ms = elapsed_ms(start),
        applied_count = outcome.result.applied_changes.len() as u64,
        skipped_count = outcome.result.skipped.len() as u64,
        document_digest = %outcome.document_digest
    );

    Ok(outcome)
}

fn patch_apply_impl(
    text: &str,
    store: &mut dyn ConfigStore,
    ctx: &RunContext,
) -> Result<RunOutcome> {
    let mut run = PatchRun::from_text(ctx.clone(), text)?;
    trace_document(run.document());

    let report = run.validate(store)?;
    tracing::debug!(
        eligible = report.eligible_count(),
        skipped = report.skipped_count(),
        "expectations checked"
    );

    let result = run.apply(store)?;
    Ok(RunOutcome::from_run(&run, result, false))
}

/// Load and validate `text`, then report what applying it would do
///
/// The store is only read.
///
/// ## Errors
///
/// - Parse-kind errors from the loader
/// - `FeatureNotFound`: a find selector matched nothing
/// - `Persistence`: the store could not be read
pub fn patch_plan(text: &str, store: &dyn ConfigStore, ctx: &RunContext) -> Result<RunOutcome> {
    let span = run_span(ctx);
    let _enter = span.enter();
    log_op_start!("patch_plan");
    let start = Instant::now();

    let outcome = patch_plan_impl(text, store, ctx).map_err(|e| {
        log_op_error!("patch_plan", e.clone(), duration_ms = elapsed_ms(start));
        e
    })?;

    log_op_end!(
        "patch_plan",
        duration_ms = elapsed_ms(start),
        applied_count = outcome.result.applied_changes.len() as u64,
        skipped_count = outcome.result.skipped.len() as u64
    );

    Ok(outcome)
}

fn patch_plan_impl(text: &str, store: &dyn ConfigStore, ctx: &RunContext) -> Result<RunOutcome> {
    let mut run = PatchRun::from_text(ctx.clone(), text)?;
    trace_document(run.document());
    run.validate(store)?;
    let result = run.plan()?;
    Ok(RunOutcome::from_run(&run, result, true))
}

/// Load `text` and summarize it without consulting any store
///
/// ## Errors
///
/// Parse-kind errors from the loader.
pub fn patch_check(text: &str, ctx: &RunContext) -> Result<DocumentSummary> {
    let span = run_span(ctx);
    let _enter = span.enter();
    log_op_start!("patch_check");
    let start = Instant::now();

    let summary = PatchRun::from_text(ctx.clone(), text)
        .map(|run| DocumentSummary::from_run(&run))
        .map_err(|e| {
            log_op_error!("patch_check", e.clone(), duration_ms = elapsed_ms(start));
            e
        })?;

    log_op_end!(
        "patch_check",
        duration_ms = elapsed_ms(start),
        param_count = summary.param_count as u64,
        feature_count = summary.feature_count as u64
    );

    Ok(summary)
}
