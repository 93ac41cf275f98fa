use thiserror::Error;

use crate::model::ApplyResult;

/// Result type alias using PatchError
pub type Result<T> = std::result::Result<T, PatchError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code used in structured logs, CLI output
/// and exit-code selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// Patch text is malformed or violates a document invariant
    Parse,
    /// A find-mode feature selector matched no record
    FeatureNotFound,
    /// The store rejected a write and the run was rolled back
    ApplyAborted,

    // Integration/IO
    Io,
    Persistence,
    Config,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Parse => "ERR_PARSE",
            ExErrorKind::FeatureNotFound => "ERR_FEATURE_NOT_FOUND",
            ExErrorKind::ApplyAborted => "ERR_APPLY_ABORTED",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Flattened view of a [`PatchError`] with classification fields for
/// programmatic handling and context for diagnosing a failed run without
/// re-running it.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    key: Option<String>,
    feature_id: Option<String>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            key: None,
            feature_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add parameter key context
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add feature id context
    pub fn with_feature_id(mut self, feature_id: impl Into<String>) -> Self {
        self.feature_id = Some(feature_id.into());
        self
    }

    /// Add a human-readable message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn feature_id(&self) -> Option<&str> {
        self.feature_id.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {})", key)?;
        }
        if let Some(feature_id) = &self.feature_id {
            write!(f, " (feature_id: {})", feature_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for patch runs
///
/// Expectation mismatches and missing keys are not errors: they are recorded
/// as skips in the [`ApplyResult`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchError {
    // ===== Loader Errors =====
    /// Patch text could not be parsed at all
    #[error("Malformed patch document: {reason}")]
    Malformed { reason: String },

    /// Only schema version 0 is understood
    #[error("Unsupported schema_version: {found}. Expected 0")]
    UnsupportedSchemaVersion { found: u32 },

    /// A change entry lacks a required (non-empty) field
    #[error("Entry {entry} is missing required field '{field}'")]
    MissingField { entry: String, field: String },

    /// The same parameter key appears twice in one document
    #[error("Duplicate parameter key in patch document: {key}")]
    DuplicateKey { key: String },

    /// The same feature id appears twice in one document
    #[error("Duplicate feature id in patch document: {feature_id}")]
    DuplicateFeature { feature_id: String },

    /// Feature entry must be exactly one of find or create
    #[error("Feature {feature_id} has invalid mode: {reason}")]
    InvalidFeatureMode { feature_id: String, reason: String },

    /// A secret-bearing field holds a literal instead of a reference
    #[error("Feature {feature_id} field '{field}' must be a credential reference (credentialsJSON:<id> or env:<VAR>), not a literal")]
    InlineSecret { feature_id: String, field: String },

    // ===== Validation Errors =====
    /// Find-mode selector matched no existing feature
    #[error("Feature not found: id={feature_id}{}", feature_type.as_ref().map(|t| format!(", type={}", t)).unwrap_or_default())]
    FeatureNotFound {
        feature_id: String,
        feature_type: Option<String>,
    },

    /// The validation report does not describe the document being applied
    #[error("Validation report does not match patch document: {reason}")]
    ReportMismatch { reason: String },

    // ===== Apply Errors =====
    /// A store write was rejected; every earlier write was rolled back
    #[error("Apply aborted at {key}: {reason}")]
    ApplyAborted {
        key: String,
        reason: String,
        /// Writes performed before the rejection, for diagnostics only
        partial: Box<ApplyResult>,
        /// False if a compensating write also failed
        rolled_back: bool,
    },

    // ===== Generic Errors =====
    /// File could not be read or written
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// Backing store failed outside of a rejected write
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Run lifecycle misuse or other internal fault
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PatchError {
    /// Canonical kind of this error
    pub fn kind(&self) -> ExErrorKind {
        match self {
            PatchError::Malformed { .. }
            | PatchError::UnsupportedSchemaVersion { .. }
            | PatchError::MissingField { .. }
            | PatchError::DuplicateKey { .. }
            | PatchError::DuplicateFeature { .. }
            | PatchError::InvalidFeatureMode { .. }
            | PatchError::InlineSecret { .. } => ExErrorKind::Parse,
            PatchError::FeatureNotFound { .. } => ExErrorKind::FeatureNotFound,
            PatchError::ApplyAborted { .. } => ExErrorKind::ApplyAborted,
            PatchError::Io { .. } => ExErrorKind::Io,
            PatchError::Persistence { .. } => ExErrorKind::Persistence,
            PatchError::Config { .. } => ExErrorKind::Config,
            PatchError::ReportMismatch { .. } | PatchError::Internal { .. } => {
                ExErrorKind::Internal
            }
        }
    }

    /// True for every failure the Patch Loader can produce
    pub fn is_parse_error(&self) -> bool {
        self.kind() == ExErrorKind::Parse
    }
}

impl From<PatchError> for ExError {
    fn from(err: PatchError) -> Self {
        let ex = ExError::new(err.kind()).with_message(err.to_string());
        match err {
            PatchError::Malformed { .. } | PatchError::UnsupportedSchemaVersion { .. } => {
                ex.with_op("load")
            }
            PatchError::MissingField { entry, .. } => ex.with_op("load").with_key(entry),
            PatchError::DuplicateKey { key } => ex.with_op("load").with_key(key),
            PatchError::DuplicateFeature { feature_id }
            | PatchError::InvalidFeatureMode { feature_id, .. }
            | PatchError::InlineSecret { feature_id, .. } => {
                ex.with_op("load").with_feature_id(feature_id)
            }
            PatchError::FeatureNotFound { feature_id, .. } => {
                ex.with_op("validate").with_feature_id(feature_id)
            }
            PatchError::ApplyAborted { key, .. } => ex.with_op("apply").with_key(key),
            PatchError::ReportMismatch { .. } => ex.with_op("apply"),
            PatchError::Io { .. }
            | PatchError::Persistence { .. }
            | PatchError::Config { .. }
            | PatchError::Internal { .. } => ex,
        }
    }
}
