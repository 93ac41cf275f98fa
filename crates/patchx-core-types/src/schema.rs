//! Field and event names used in PatchX logs
//!
//! The engine emits these names literally in `tracing` calls; tests and log
//! consumers refer to them through the constants.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_RUN_ID: &str = "run_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Patch identifiers
pub const FIELD_PARAM_KEY: &str = "param_key";
pub const FIELD_FEATURE_ID: &str = "feature_id";
pub const FIELD_DOCUMENT_DIGEST: &str = "document_digest";

// Collection sizes
pub const FIELD_PARAM_COUNT: &str = "param_count";
pub const FIELD_FEATURE_COUNT: &str = "feature_count";
pub const FIELD_APPLIED_COUNT: &str = "applied_count";
pub const FIELD_SKIPPED_COUNT: &str = "skipped_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
