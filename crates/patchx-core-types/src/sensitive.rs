//! Sensitive data marker for automatic redaction
//!
//! Feature fields such as `accessToken` carry credential references. Even a
//! reference is treated as sensitive: it is wrapped in `Sensitive<T>` before
//! it reaches a log line or a rendered report.

use serde::{Serialize, Serializer};
use std::fmt;

/// Replacement text emitted wherever a sensitive value would appear
pub const REDACTED: &str = "***REDACTED***";

/// Wrapper for sensitive data that redacts itself in Debug, Display and Serialize
///
/// # Example
///
/// ```
/// use patchx_core_types::Sensitive;
///
/// let token = Sensitive::new("credentialsJSON:structurize-github-token");
/// assert_eq!(format!("{:?}", token), "***REDACTED***");
/// assert_eq!(format!("{}", token), "***REDACTED***");
///
/// // Access the actual value when needed
/// assert_eq!(token.expose(), &"credentialsJSON:structurize-github-token");
/// ```
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    /// Wrap a sensitive value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying sensitive value
    ///
    /// Only the store write path should need this.
    pub fn expose(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> Serialize for Sensitive<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

impl<T: Clone> Clone for Sensitive<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: PartialEq> PartialEq for Sensitive<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_debug_redaction() {
        let secret = Sensitive::new("credentialsJSON:abc");
        let debug_str = format!("{:?}", secret);
        assert_eq!(debug_str, REDACTED);
        assert!(!debug_str.contains("credentialsJSON"));
    }

    #[test]
    fn test_sensitive_serialize_redaction() {
        let secret = Sensitive::new("env:GH_TOKEN".to_string());
        let json = serde_json::to_string(&secret).unwrap();
        assert_eq!(json, "\"***REDACTED***\"");
    }

    #[test]
    fn test_sensitive_expose_and_into_inner() {
        let secret = Sensitive::new(String::from("env:GH_TOKEN"));
        assert_eq!(secret.expose(), "env:GH_TOKEN");
        assert_eq!(secret.into_inner(), "env:GH_TOKEN");
    }

    #[test]
    fn test_sensitive_with_struct() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Field {
            name: String,
            value: Sensitive<String>,
        }

        let field = Field {
            name: "accessToken".to_string(),
            value: Sensitive::new("credentialsJSON:1234".to_string()),
        };

        let debug_str = format!("{:?}", field);
        assert!(debug_str.contains("accessToken"));
        assert!(debug_str.contains(REDACTED));
        assert!(!debug_str.contains("1234"));
    }
}
