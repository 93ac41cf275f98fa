//! PatchX Store - Patch loading and SQLite-backed configuration store
//!
//! Provides:
//! - Patch Format v0 loader and document digest
//! - SQLite schema with migrations framework
//! - `SqliteConfigStore`, a `ConfigStore` persisting parameters and features

pub mod db;
pub mod errors;
pub mod migrations;
pub mod patch;
pub mod sqlite_store;

// Re-export key types
pub use errors::Result;
pub use patch::{document_digest, load, load_file};
pub use sqlite_store::SqliteConfigStore;
