//! Run-boundary event macros
//!
//! A patch run reports its lifecycle as three kinds of event, all sharing
//! the `component`/`op`/`event` triple so a log query can pair a run's
//! `start` with its `end` or `end_error`. The public macros differ only in
//! level, event name and mandatory fields; the shared shape lives in
//! [`__log_op_event!`].
//!
//! Extra fields use ordinary `tracing` field syntax and are appended after
//! the mandatory ones. Wrap secret values in `Sensitive` before passing them.

/// Emit one boundary event. Not part of the public API.
#[doc(hidden)]
#[macro_export]
macro_rules! __log_op_event {
    ($level:ident, $op:expr, $event:expr $(, $($field:tt)*)?) => {
        $crate::__private::tracing::event!(
            $crate::__private::tracing::Level::$level,
            component = module_path!(),
            op = $op,
            event = $event,
            $($($field)*)?
        )
    };
}

/// `start` event for `op`, at INFO
///
/// ```
/// # use patchx_core::log_op_start;
/// log_op_start!("patch_apply");
/// log_op_start!("patch_apply", project = "_Self", param_count = 2u64);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(
            INFO,
            $op,
            $crate::__private::schema::EVENT_START
            $(, $($field)*)?
        )
    };
}

/// `end` event for `op`, at INFO; `duration_ms` is required
///
/// ```
/// # use patchx_core::log_op_end;
/// log_op_end!("patch_plan", duration_ms = 3u64, applied_count = 1u64);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(
            INFO,
            $op,
            $crate::__private::schema::EVENT_END,
            duration_ms = $duration
            $(, $($field)*)?
        )
    };
}

/// `end_error` event for `op`, at ERROR
///
/// `err` is anything convertible into [`ExError`](crate::errors::ExError);
/// its kind and stable code are recorded as `err.kind` and `err.code`. The
/// error message is not logged, since it may quote patch values.
///
/// ```
/// # use patchx_core::{log_op_error, errors::PatchError};
/// let err = PatchError::DuplicateKey { key: "Release Branch".to_string() };
/// log_op_error!("patch_check", err, duration_ms = 1u64);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = ($err).into();
        $crate::__log_op_event!(
            ERROR,
            $op,
            $crate::__private::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code()
            $(, $($field)*)?
        )
    }};
}
