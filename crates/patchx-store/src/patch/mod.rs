//! Patch Loader
//!
//! Provides:
//! - Patch Format v0 schema
//! - YAML parser producing an invariant-checked `PatchDocument`
//! - Digest canonicalization

pub mod digest;
pub mod format_v0;
pub mod parser;

pub use digest::document_digest;
pub use format_v0::PatchV0;
pub use parser::{load, load_file, SCHEMA_VERSION};
