//! Patch document digest
//!
//! The digest identifies *what* a patch does, independent of how its YAML is
//! laid out: the parsed document is serialized to JSON (entries in document
//! order, feature fields in name order) and hashed with SHA-256.

use crate::errors::Result;
use patchx_core::errors::PatchError;
use patchx_core::model::PatchDocument;
use sha2::{Digest, Sha256};

/// SHA-256 hex digest of the canonical form of `document`
///
/// # Errors
///
/// `Internal` if the document cannot be serialized.
pub fn document_digest(document: &PatchDocument) -> Result<String> {
    let mut hasher = Sha256::new();
    serde_json::to_writer(&mut hasher, document).map_err(|e| PatchError::Internal {
        message: format!("failed to canonicalize patch document: {}", e),
    })?;
    Ok(hex::encode(hasher.finalize()))
}
