//! Error taxonomy for regress-serve-core.
//!
//! # Error Categories
//!
//! | Category | Type | Scope | Effect on service |
//! |----------|------|-------|-------------------|
//! | Load | [`LoadError`] | process | Health becomes `Degraded`, every predict is `ServiceUnavailable` |
//! | Validation | [`ValidationError`] | request | None |
//! | Inference | [`InferenceError`] | request | None, service stays `Ready` |
//! | Configuration | [`ConfigError`] | startup | Binary refuses to start |
//!
//! [`ServiceError`] is what [`PredictionService::predict`](crate::service::PredictionService::predict)
//! returns; the HTTP layer maps each variant to exactly one status code.

use std::fmt;

use thiserror::Error;

use crate::contract::FeatureKind;

/// Failure to turn the configured artifact path into a predictor.
///
/// Stored inside [`ServiceState`](crate::service::ServiceState) for the
/// lifetime of the process, so every variant carries owned strings only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Nothing exists at the configured path.
    #[error("ArtifactMissing: no artifact at {path}")]
    ArtifactMissing {
        /// Configured artifact path.
        path: String,
    },

    /// The path exists but could not be read.
    #[error("ArtifactUnreadable: {path}: {reason}")]
    ArtifactUnreadable { path: String, reason: String },

    /// The file is not valid JSON.
    #[error("DeserializationFailed: {path}: {reason}")]
    Deserialization { path: String, reason: String },

    /// The document is valid JSON but not an object.
    #[error("UnrecognizedArtifact: expected a JSON object, found {found}")]
    UnrecognizedShape { found: &'static str },

    /// The document is a bundle but none of the predictor alias keys is present.
    #[error("NoPredictorKey: bundle has none of {expected:?} (found keys {found:?})")]
    NoPredictorKey {
        /// Alias keys that were searched, in search order.
        expected: Vec<String>,
        /// Top-level keys actually present.
        found: Vec<String>,
    },

    /// A predictor document was found but is malformed.
    #[error("InvalidPredictor: {reason}")]
    InvalidPredictor { reason: String },

    /// The bundle's `contract` sub-document is malformed.
    #[error("InvalidContract: {reason}")]
    InvalidContract { reason: String },
}

/// One request value whose JSON type does not fit the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    pub feature: String,
    pub expected: FeatureKind,
    /// JSON type name of the supplied value (`"string"`, `"null"`, ...).
    pub found: &'static str,
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (expected {}, got {})",
            self.feature, self.expected, self.found
        )
    }
}

/// A request that does not satisfy the feature contract.
///
/// Always lists every offending feature, never only the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    /// Contract features absent from the request, in contract order.
    pub missing: Vec<String>,
    /// Contract features present with an unusable value, in contract order.
    pub mismatched: Vec<TypeMismatch>,
}

impl ValidationError {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.mismatched.is_empty()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(2);
        if !self.missing.is_empty() {
            parts.push(format!("Missing required features: {:?}", self.missing));
        }
        if !self.mismatched.is_empty() {
            let items: Vec<String> = self.mismatched.iter().map(ToString::to_string).collect();
            parts.push(format!("Invalid feature types: {}", items.join(", ")));
        }
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Failure raised by a predictor while evaluating one row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// Row width differs from the predictor's input width.
    #[error("expected {expected} input values, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    /// A categorical slot received a number or a numeric slot a category.
    #[error("input {index}: expected {expected} value")]
    WrongValueKind { index: usize, expected: FeatureKind },

    /// Category never seen during training and the column refuses unknowns.
    #[error("input {index}: unknown category {category:?}")]
    UnknownCategory { index: usize, category: String },

    /// The model produced NaN or an infinity.
    #[error("prediction is not finite ({value})")]
    NonFinite { value: f64 },
}

/// Error returned by [`PredictionService::predict`](crate::service::PredictionService::predict).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// The model is not loaded (health is `Uninitialized` or `Degraded`).
    #[error("Model not loaded")]
    ServiceUnavailable,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),
}

/// Configuration loading or validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration: {field} - {message}")]
    Invalid { field: &'static str, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(e: config::ConfigError) -> Self {
        Self::Parse(e.to_string())
    }
}

pub type LoadResult<T> = Result<T, LoadError>;
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_every_missing_feature() {
        let err = ValidationError {
            missing: vec!["Seats".into(), "PowerTrain".into()],
            mismatched: vec![],
        };
        assert_eq!(
            err.to_string(),
            r#"Missing required features: ["Seats", "PowerTrain"]"#
        );
    }

    #[test]
    fn test_validation_error_combines_missing_and_mismatched() {
        let err = ValidationError {
            missing: vec!["PowerTrain".into()],
            mismatched: vec![TypeMismatch {
                feature: "Seats".into(),
                expected: FeatureKind::Numeric,
                found: "string",
            }],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Missing required features"));
        assert!(msg.contains("Invalid feature types: Seats (expected numeric, got string)"));
    }

    #[test]
    fn test_service_error_messages() {
        assert_eq!(ServiceError::ServiceUnavailable.to_string(), "Model not loaded");
        let err = ServiceError::from(InferenceError::NonFinite { value: f64::INFINITY });
        assert_eq!(err.to_string(), "Inference error: prediction is not finite (inf)");
    }

    #[test]
    fn test_load_error_names_the_failure_kind() {
        let err = LoadError::ArtifactMissing {
            path: "models/missing.json".into(),
        };
        assert!(err.to_string().starts_with("ArtifactMissing:"));
        assert!(err.to_string().contains("models/missing.json"));
    }
}
