//! Logging for patch runs
//!
//! Everything PatchX logs goes through `tracing`. The pieces here decide
//! where it ends up and what a run's log looks like:
//!
//! - [`init`] installs the subscriber for a [`Profile`]. The CLI calls it once,
//!   before opening any store, and all output goes to stderr so stdout stays
//!   free for reports.
//! - `log_op_start!`, `log_op_end!` and `log_op_error!` emit the boundary
//!   events of an engine command. Only the engine emits them; core and store
//!   code log at debug level inside the `patch_run` span and inherit its
//!   `run_id` and `trace_id`.
//! - [`test_capture`] records events in memory, span fields included, for
//!   tests that assert on what was (and was not) logged.
//!
//! ```rust
//! use patchx_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
