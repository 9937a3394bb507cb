//! Prediction request validation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::artifact::json_type_name;
use crate::contract::{FeatureContract, FeatureKind};
use crate::error::{TypeMismatch, ValidationError};
use crate::predictor::FeatureValue;

/// Caller-supplied feature values keyed by feature name.
///
/// Keys outside the contract are accepted and ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionRequest(Map<String, Value>);

impl PredictionRequest {
    #[must_use]
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn get(&self, feature: &str) -> Option<&Value> {
        self.0.get(feature)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build the input row in contract order.
    ///
    /// # Errors
    ///
    /// [`ValidationError`] listing every missing feature and every value of
    /// the wrong type.
    pub fn to_row(&self, contract: &FeatureContract) -> Result<Vec<FeatureValue>, ValidationError> {
        let mut row = Vec::with_capacity(contract.len());
        let mut error = ValidationError::default();

        for spec in contract.features() {
            match self.0.get(&spec.name) {
                None => error.missing.push(spec.name.clone()),
                Some(value) => match coerce(value, spec.kind) {
                    Ok(v) => row.push(v),
                    Err(found) => error.mismatched.push(TypeMismatch {
                        feature: spec.name.clone(),
                        expected: spec.kind,
                        found,
                    }),
                },
            }
        }

        if error.is_empty() {
            Ok(row)
        } else {
            Err(error)
        }
    }
}

impl From<Map<String, Value>> for PredictionRequest {
    fn from(values: Map<String, Value>) -> Self {
        Self(values)
    }
}

/// Convert one JSON value to the contract's kind, or report its JSON type.
///
/// Numeric features accept numbers only. Categorical features accept
/// strings, integers and booleans; integers and booleans are stringified.
fn coerce(value: &Value, kind: FeatureKind) -> Result<FeatureValue, &'static str> {
    match (kind, value) {
        (FeatureKind::Numeric, Value::Number(n)) => {
            n.as_f64().map(FeatureValue::Number).ok_or("number")
        }
        (FeatureKind::Categorical, Value::String(s)) => Ok(FeatureValue::Category(s.clone())),
        (FeatureKind::Categorical, Value::Number(n)) if n.is_i64() || n.is_u64() => {
            Ok(FeatureValue::Category(n.to_string()))
        }
        (FeatureKind::Categorical, Value::Bool(b)) => Ok(FeatureValue::Category(b.to_string())),
        (_, other) => Err(json_type_name(other)),
    }
}
