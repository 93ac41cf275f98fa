//! Migration checksums
//!
//! A migration's checksum is recorded when it is applied and compared on every
//! later open, so an edited migration file is caught instead of silently
//! diverging from databases created before the edit.

use sha2::{Digest, Sha256};

/// SHA-256 hex of a migration's SQL, insensitive to CRLF line endings
pub fn compute_checksum(sql: &str) -> String {
    let mut hasher = Sha256::new();
    for line in sql.lines() {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
