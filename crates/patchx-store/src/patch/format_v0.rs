//! Patch Format v0 schema
//!
//! Defines the YAML structure of a patch document. Fields the document model
//! requires are optional here so a missing entry field is reported as a
//! `MissingField` naming the entry, rather than as a generic YAML error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level patch file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchV0 {
    /// Schema version (must be 0 for this format)
    pub schema_version: u32,

    /// Target project id; defaults to `_Self`
    #[serde(default)]
    pub project: Option<String>,

    #[serde(default)]
    pub params: Vec<ParamEntryV0>,

    #[serde(default)]
    pub features: Vec<FeatureEntryV0>,
}

/// `expect` / `update` pair for one parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamEntryV0 {
    pub key: Option<Scalar>,
    pub expect: Option<Scalar>,
    pub update: Option<Scalar>,
}

/// Find-or-create entry for one project feature
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureEntryV0 {
    pub id: Option<Scalar>,

    #[serde(rename = "type", default)]
    pub feature_type: Option<String>,

    /// `find` or `create`
    pub mode: Option<String>,

    #[serde(default)]
    pub fields: BTreeMap<String, Scalar>,
}

/// A YAML scalar read as text
///
/// Unquoted `true` or `8080` are accepted and kept as written. Unquoted floats
/// are refused: YAML reads `1.20` as the number 1.2, which would silently
/// change a version string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Scalar(pub String);

impl Scalar {
    pub fn into_string(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};
        use std::fmt;

        struct ScalarVisitor;

        impl<'de> Visitor<'de> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string, integer or boolean")
            }

            fn visit_str<E>(self, value: &str) -> Result<Scalar, E>
            where
                E: de::Error,
            {
                Ok(Scalar(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Scalar, E>
            where
                E: de::Error,
            {
                Ok(Scalar(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Scalar, E>
            where
                E: de::Error,
            {
                Ok(Scalar(value.to_string()))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Scalar, E>
            where
                E: de::Error,
            {
                Ok(Scalar(value.to_string()))
            }

            fn visit_bool<E>(self, value: bool) -> Result<Scalar, E>
            where
                E: de::Error,
            {
                Ok(Scalar(value.to_string()))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Scalar, E>
            where
                E: de::Error,
            {
                Err(E::custom(format!(
                    "numeric value {} must be quoted to keep its exact text",
                    value
                )))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}
