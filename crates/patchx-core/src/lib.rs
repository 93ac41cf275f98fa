//! PatchX Core - declarative configuration patch kernel
//!
//! This crate provides the store-agnostic heart of PatchX:
//! - Patch data model (parameter and feature changes, apply results)
//! - The `ConfigStore` seam plus an in-memory implementation
//! - Expectation validation (read-only, skip-not-fail for mismatches)
//! - Journaled all-or-nothing application and dry-run planning
//! - Error and logging facilities shared by the other crates

pub mod apply;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod rules;

// Re-export commonly used types
pub use apply::{apply, plan};
pub use errors::{ExError, ExErrorKind, PatchError, Result};
pub use model::{ApplyResult, FeatureChange, FeatureRecord, ParamChange, PatchDocument};
pub use ops::{ConfigStore, InMemoryStore, StoreError};
pub use rules::{validate, ValidationReport};

#[doc(hidden)]
pub mod __private {
    pub use patchx_core_types::schema;
    pub use tracing;
}
