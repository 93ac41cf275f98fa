//! Credential references for secret-bearing feature fields.
//!
//! Patch documents never carry a credential literal. A secret field holds a
//! pointer into the host's secret storage instead:
//!
//! - `credentialsJSON:<id>` for a credential kept by the CI server
//! - `env:<VAR>` for a value resolved from the environment of the host

use std::fmt;

const CREDENTIALS_PREFIX: &str = "credentialsJSON:";
const ENV_PREFIX: &str = "env:";

/// True if a field with this name must hold a [`SecretRef`]
pub fn is_secret_field(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ["token", "password", "secret"]
        .iter()
        .any(|marker| lower.contains(marker))
}

/// A parsed credential reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretRef {
    Credentials(String),
    Env(String),
}

impl SecretRef {
    /// Parse a field value; `None` means the value is a literal
    pub fn parse(value: &str) -> Option<Self> {
        if let Some(id) = value.strip_prefix(CREDENTIALS_PREFIX) {
            return (!id.trim().is_empty()).then(|| SecretRef::Credentials(id.to_string()));
        }
        if let Some(var) = value.strip_prefix(ENV_PREFIX) {
            let valid = !var.is_empty()
                && var
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_');
            return valid.then(|| SecretRef::Env(var.to_string()));
        }
        None
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretRef::Credentials(id) => write!(f, "{}{}", CREDENTIALS_PREFIX, id),
            SecretRef::Env(var) => write!(f, "{}{}", ENV_PREFIX, var),
        }
    }
}
