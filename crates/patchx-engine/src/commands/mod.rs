//! Command orchestration layer.
//!
//! Provides high-level command functions that coordinate between
//! the loader, the validator/applier in core and the host's store.

pub mod engine_command;
pub mod patch_run;
