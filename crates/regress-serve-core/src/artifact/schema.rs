//! Serialized artifact schema.
//!
//! These types mirror the JSON document written by the training job. They
//! are kept separate from the runtime predictor types so the on-disk format
//! can evolve independently and so structural validation has one place to
//! happen (`from_schema` on each runtime type).
//!
//! Maps use `BTreeMap` so that re-serialized artifacts are deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::contract::FeatureKind;

/// A bare predictor document, discriminated by its `kind` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictorSchema {
    /// Additive linear model with one-hot categorical columns.
    Linear(LinearSchema),
    /// Additive ensemble of decision trees.
    Forest(ForestSchema),
}

/// Post-processing applied to the raw model output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputTransformSchema {
    /// Raw output.
    #[default]
    Identity,
    /// `exp(raw)`, for models trained on a log target.
    Exp,
}

/// Policy for categories that were not seen during training.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknownSchema {
    /// Unknown categories contribute nothing.
    #[default]
    Ignore,
    /// Unknown categories fail the prediction.
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSchema {
    /// Names of the columns the model was fit on, in input order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names_in: Option<Vec<String>>,
    pub intercept: f64,
    /// One entry per input position.
    pub columns: Vec<ColumnSchema>,
    #[serde(default)]
    pub output_transform: OutputTransformSchema,
}

/// Encoding of a single linear-model input column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnSchema {
    /// Contributes `coefficient * (x - center) / scale`.
    Numeric {
        coefficient: f64,
        #[serde(default)]
        center: f64,
        #[serde(default = "unit_scale")]
        scale: f64,
    },
    /// Contributes `weights[x]` (one-hot encoding).
    Categorical {
        weights: BTreeMap<String, f64>,
        #[serde(default)]
        handle_unknown: HandleUnknownSchema,
    },
}

fn unit_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names_in: Option<Vec<String>>,
    /// Input width.
    pub n_features: usize,
    #[serde(default)]
    pub base_score: f64,
    /// Average tree outputs instead of summing them.
    #[serde(default)]
    pub average: bool,
    /// Category vocabulary per categorical input; a category's code is its
    /// position in the list.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub categories: BTreeMap<usize, Vec<String>>,
    pub trees: Vec<TreeSchema>,
    #[serde(default)]
    pub output_transform: OutputTransformSchema,
}

/// One tree in structure-of-arrays layout.
///
/// All arrays have one entry per node. A node whose left child is `0` is a
/// leaf (the root can never be a child).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSchema {
    pub split_indices: Vec<u32>,
    pub thresholds: Vec<f64>,
    pub children_left: Vec<u32>,
    pub children_right: Vec<u32>,
    pub default_left: Vec<bool>,
    pub leaf_values: Vec<f64>,
    /// Nodes that split on category membership: node index to the set of
    /// category codes that go right.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub category_sets: BTreeMap<u32, Vec<u32>>,
}

/// The `contract` sub-document of a bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawContract {
    /// Declared input features, in predictor input order.
    #[serde(default)]
    pub features: Vec<RawFeature>,
    /// Name of the predicted quantity (informational).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// A declared feature: either a bare name or a name with an explicit type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFeature {
    Name(String),
    Typed {
        name: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        kind: Option<FeatureKind>,
    },
}

impl RawFeature {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Typed { name, .. } => name,
        }
    }

    #[must_use]
    pub fn declared_kind(&self) -> Option<FeatureKind> {
        match self {
            Self::Name(_) => None,
            Self::Typed { kind, .. } => *kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_predictor_schema_is_tagged_by_kind() {
        let doc = json!({
            "kind": "linear",
            "intercept": 1.5,
            "columns": [{"type": "numeric", "coefficient": 2.0}]
        });
        let schema: PredictorSchema = serde_json::from_value(doc).unwrap();
        match schema {
            PredictorSchema::Linear(linear) => {
                assert_eq!(linear.intercept, 1.5);
                assert_eq!(linear.output_transform, OutputTransformSchema::Identity);
                assert_eq!(
                    linear.columns[0],
                    ColumnSchema::Numeric {
                        coefficient: 2.0,
                        center: 0.0,
                        scale: 1.0
                    }
                );
            }
            other => panic!("expected linear schema, got {:?}", other),
        }
    }

    #[test]
    fn test_forest_category_keys_parse_from_json_strings() {
        let doc = json!({
            "kind": "forest",
            "n_features": 2,
            "categories": {"1": ["a", "b"]},
            "trees": [{
                "split_indices": [0],
                "thresholds": [0.0],
                "children_left": [0],
                "children_right": [0],
                "default_left": [true],
                "leaf_values": [1.0],
                "category_sets": {}
            }]
        });
        let schema: PredictorSchema = serde_json::from_value(doc).unwrap();
        let PredictorSchema::Forest(forest) = schema else {
            panic!("expected forest schema");
        };
        assert_eq!(forest.categories.get(&1).map(Vec::len), Some(2));
        assert!(!forest.average);
    }

    #[test]
    fn test_raw_contract_accepts_names_and_typed_entries() {
        let doc = json!({
            "features": ["Seats", {"name": "PowerTrain", "type": "categorical"}, {"name": "Range_Km"}]
        });
        let contract: RawContract = serde_json::from_value(doc).unwrap();
        let names: Vec<&str> = contract.features.iter().map(RawFeature::name).collect();
        assert_eq!(names, ["Seats", "PowerTrain", "Range_Km"]);
        assert_eq!(contract.features[0].declared_kind(), None);
        assert_eq!(
            contract.features[1].declared_kind(),
            Some(FeatureKind::Categorical)
        );
        assert_eq!(contract.features[2].declared_kind(), None);
    }

    #[test]
    fn test_unknown_column_type_is_rejected() {
        let doc = json!({
            "kind": "linear",
            "intercept": 0.0,
            "columns": [{"type": "ordinal", "coefficient": 1.0}]
        });
        assert!(serde_json::from_value::<PredictorSchema>(doc).is_err());
    }
}
