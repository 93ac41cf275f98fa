pub mod invariants;
pub mod validation;

pub use validation::{validate, FeatureCheck, FeatureTarget, ParamCheck, ParamVerdict, ValidationReport};
