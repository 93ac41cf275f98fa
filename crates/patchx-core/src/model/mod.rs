pub mod document;
pub mod feature;
pub mod result;
pub mod secret;

pub use document::{FeatureChange, FeatureMode, ParamChange, PatchDocument, DEFAULT_PROJECT};
pub use feature::FeatureRecord;
pub use result::{
    AppliedChange, ApplyResult, FeatureAction, FeatureOutcome, SkipReason, SkippedChange,
};
pub use secret::{is_secret_field, SecretRef};
