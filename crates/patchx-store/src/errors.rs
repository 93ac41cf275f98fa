//! Error handling for patchx-store
//!
//! Maps SQLite, filesystem and YAML failures onto core `PatchError` variants

use patchx_core::errors::PatchError;
use std::path::Path;

/// Result type alias using PatchError
pub type Result<T> = std::result::Result<T, PatchError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> PatchError {
    PatchError::Persistence {
        message: format!("Migration {} failed: {}", migration_id, reason),
    }
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> PatchError {
    PatchError::Persistence {
        message: format!(
            "Checksum mismatch for migration {}: recorded {}, embedded {}",
            migration_id, expected, actual
        ),
    }
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> PatchError {
    PatchError::Persistence {
        message: format!("sqlite: {}", err),
    }
}

/// Create an IO error for `path`
pub fn io_error(path: &Path, err: std::io::Error) -> PatchError {
    PatchError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// Create a loader error for text that is not a valid patch document
pub fn malformed(reason: impl Into<String>) -> PatchError {
    PatchError::Malformed {
        reason: reason.into(),
    }
}
