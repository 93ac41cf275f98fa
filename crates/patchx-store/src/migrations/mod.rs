//! Migration framework
//!
//! Provides:
//! - Migration runner recording each applied migration with its checksum
//! - Idempotent application
//! - Detection of embedded migrations edited after they were applied

mod checksums;
mod embedded;
mod runner;

pub use runner::apply_migrations;
