//! Runtime predictors.
//!
//! A [`Predictor`] maps one ordered row of [`FeatureValue`]s to a single
//! finite `f64`. Predictors are built once from their serialized schema by
//! the artifact loader and never mutated afterwards.
//!
//! # Thread Safety
//!
//! Predictors are plain immutable data: evaluation takes `&self`, allocates
//! nothing shared and calls no foreign numeric kernels. They are `Send + Sync`
//! and safe to invoke from any number of threads at once, so the service
//! shares them behind an `Arc` without a lock.

mod forest;
mod linear;

use std::fmt;

use crate::artifact::schema::{OutputTransformSchema, PredictorSchema};
use crate::contract::FeatureKind;
use crate::error::{InferenceError, LoadError, LoadResult};

pub use forest::ForestPredictor;
pub use linear::LinearPredictor;

/// A single validated input value.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Category(String),
}

impl FeatureValue {
    #[must_use]
    pub fn kind(&self) -> FeatureKind {
        match self {
            Self::Number(_) => FeatureKind::Numeric,
            Self::Category(_) => FeatureKind::Categorical,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{}", v),
            Self::Category(c) => write!(f, "{:?}", c),
        }
    }
}

/// Transformation applied to the raw additive score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputTransform {
    #[default]
    Identity,
    Exp,
}

impl OutputTransform {
    #[inline]
    fn apply(self, raw: f64) -> f64 {
        match self {
            Self::Identity => raw,
            Self::Exp => raw.exp(),
        }
    }
}

impl From<OutputTransformSchema> for OutputTransform {
    fn from(schema: OutputTransformSchema) -> Self {
        match schema {
            OutputTransformSchema::Identity => Self::Identity,
            OutputTransformSchema::Exp => Self::Exp,
        }
    }
}

/// A trained regression model.
#[derive(Debug, Clone)]
pub enum Predictor {
    Linear(LinearPredictor),
    Forest(ForestPredictor),
}

impl Predictor {
    /// Build and structurally validate a predictor from its schema.
    ///
    /// # Errors
    ///
    /// [`LoadError::InvalidPredictor`] if the document is inconsistent
    /// (mismatched array lengths, non-finite weights, dangling child indices...).
    pub fn from_schema(schema: PredictorSchema) -> LoadResult<Self> {
        let predictor = match schema {
            PredictorSchema::Linear(s) => Self::Linear(LinearPredictor::from_schema(s)?),
            PredictorSchema::Forest(s) => Self::Forest(ForestPredictor::from_schema(s)?),
        };
        Ok(predictor)
    }

    /// Short name of the model family, for logs.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Linear(_) => "linear",
            Self::Forest(_) => "forest",
        }
    }

    /// Names the predictor was fit on, when the artifact recorded them.
    #[must_use]
    pub fn feature_names(&self) -> Option<&[String]> {
        match self {
            Self::Linear(p) => p.feature_names(),
            Self::Forest(p) => p.feature_names(),
        }
    }

    /// Expected kind of each input position.
    #[must_use]
    pub fn input_kinds(&self) -> &[FeatureKind] {
        match self {
            Self::Linear(p) => p.input_kinds(),
            Self::Forest(p) => p.input_kinds(),
        }
    }

    /// Number of values in one input row.
    #[must_use]
    pub fn n_inputs(&self) -> usize {
        self.input_kinds().len()
    }

    /// Evaluate one row.
    ///
    /// # Errors
    ///
    /// [`InferenceError`] on a width or kind mismatch, an unknown category
    /// the model refuses, or a non-finite result.
    pub fn predict(&self, row: &[FeatureValue]) -> Result<f64, InferenceError> {
        let kinds = self.input_kinds();
        if row.len() != kinds.len() {
            return Err(InferenceError::WidthMismatch {
                expected: kinds.len(),
                actual: row.len(),
            });
        }
        if let Some(index) = row.iter().zip(kinds).position(|(v, k)| v.kind() != *k) {
            return Err(InferenceError::WrongValueKind {
                index,
                expected: kinds[index],
            });
        }

        let value = match self {
            Self::Linear(p) => p.predict_row(row)?,
            Self::Forest(p) => p.predict_row(row)?,
        };

        if !value.is_finite() {
            return Err(InferenceError::NonFinite { value });
        }
        Ok(value)
    }
}

/// Upper bound on the input width of any predictor.
///
/// A forest's width is read from `n_features` and sizes per-input tables
/// before anything else is checked, so it must be bounded.
pub const MAX_INPUT_FEATURES: usize = 1 << 16;

/// Reject an input width of zero or above [`MAX_INPUT_FEATURES`].
fn check_input_width(what: &str, width: usize) -> LoadResult<()> {
    if width == 0 {
        return Err(LoadError::InvalidPredictor {
            reason: format!("{} has zero input features", what),
        });
    }
    if width > MAX_INPUT_FEATURES {
        return Err(LoadError::InvalidPredictor {
            reason: format!(
                "{} declares {} input features, the limit is {}",
                what, width, MAX_INPUT_FEATURES
            ),
        });
    }
    Ok(())
}

/// Reject a non-finite number found in a predictor document.
fn ensure_finite(what: impl fmt::Display, value: f64) -> LoadResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LoadError::InvalidPredictor {
            reason: format!("{} is not finite ({})", what, value),
        })
    }
}

/// Reject `feature_names_in` whose length differs from the input width.
fn check_feature_names(names: Option<&Vec<String>>, width: usize) -> LoadResult<()> {
    match names {
        Some(names) if names.len() != width => Err(LoadError::InvalidPredictor {
            reason: format!(
                "feature_names_in has {} names but the model takes {} inputs",
                names.len(),
                width
            ),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn linear() -> Predictor {
        let schema = serde_json::from_value(json!({
            "kind": "linear",
            "intercept": 1.0,
            "columns": [
                {"type": "numeric", "coefficient": 2.0},
                {"type": "categorical", "weights": {"a": 10.0}}
            ]
        }))
        .unwrap();
        Predictor::from_schema(schema).unwrap()
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let err = linear().predict(&[FeatureValue::Number(1.0)]).unwrap_err();
        assert_eq!(
            err,
            InferenceError::WidthMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_predict_rejects_wrong_value_kind() {
        let row = [
            FeatureValue::Category("x".into()),
            FeatureValue::Category("a".into()),
        ];
        let err = linear().predict(&row).unwrap_err();
        assert_eq!(
            err,
            InferenceError::WrongValueKind {
                index: 0,
                expected: FeatureKind::Numeric
            }
        );
    }

    #[test]
    fn test_predict_sums_linear_terms() {
        let row = [FeatureValue::Number(3.0), FeatureValue::Category("a".into())];
        let y = linear().predict(&row).unwrap();
        assert!((y - 17.0).abs() < 1e-12);
    }

    #[test]
    fn test_exp_overflow_is_non_finite() {
        let schema = serde_json::from_value(json!({
            "kind": "linear",
            "intercept": 0.0,
            "output_transform": "exp",
            "columns": [{"type": "numeric", "coefficient": 1.0}]
        }))
        .unwrap();
        let predictor = Predictor::from_schema(schema).unwrap();
        let err = predictor.predict(&[FeatureValue::Number(1.0e6)]).unwrap_err();
        assert!(matches!(err, InferenceError::NonFinite { .. }));
    }

    #[test]
    fn test_predictor_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Predictor>();
    }
}
