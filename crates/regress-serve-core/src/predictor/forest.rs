//! Decision-tree ensemble.
//!
//! Trees arrive in structure-of-arrays layout and are converted into a
//! compact node vector at load time. Traversal rules:
//!
//! | Split | Goes left when | Unknown category |
//! |-------|----------------|------------------|
//! | Numeric | `x < threshold` | n/a |
//! | Categorical | code **not** in the node's set | follows `default_left` |

use std::collections::{BTreeSet, HashMap};

use crate::artifact::schema::{ForestSchema, TreeSchema};
use crate::contract::FeatureKind;
use crate::error::{InferenceError, LoadError, LoadResult};

use super::{
    check_feature_names, check_input_width, ensure_finite, FeatureValue, OutputTransform,
};

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Numeric {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Categorical {
        feature: usize,
        right_codes: BTreeSet<u32>,
        left: usize,
        right: usize,
        default_left: bool,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_schema(
        tree_idx: usize,
        schema: TreeSchema,
        kinds: &[FeatureKind],
    ) -> LoadResult<Self> {
        let invalid = |reason: String| LoadError::InvalidPredictor {
            reason: format!("tree {}: {}", tree_idx, reason),
        };

        let n = schema.children_left.len();
        if n == 0 {
            return Err(invalid("has no nodes".to_string()));
        }
        let lengths = [
            schema.split_indices.len(),
            schema.thresholds.len(),
            schema.children_right.len(),
            schema.default_left.len(),
            schema.leaf_values.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(invalid(format!(
                "node arrays disagree in length (children_left has {})",
                n
            )));
        }
        if let Some(node) = schema.category_sets.keys().find(|&&k| k as usize >= n) {
            return Err(invalid(format!("category set for missing node {}", node)));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let left = schema.children_left[i] as usize;
            if left == 0 {
                ensure_finite(format_args!("tree {} leaf {}", tree_idx, i), schema.leaf_values[i])?;
                nodes.push(Node::Leaf(schema.leaf_values[i]));
                continue;
            }

            let right = schema.children_right[i] as usize;
            // Children must come after their parent; this rules out cycles.
            for child in [left, right] {
                if child <= i || child >= n {
                    return Err(invalid(format!("node {} has invalid child {}", i, child)));
                }
            }
            let feature = schema.split_indices[i] as usize;
            let Some(kind) = kinds.get(feature) else {
                return Err(invalid(format!(
                    "node {} splits on feature {} of {}",
                    i,
                    feature,
                    kinds.len()
                )));
            };

            let node = match schema.category_sets.get(&(i as u32)) {
                Some(codes) => {
                    if *kind != FeatureKind::Categorical {
                        return Err(invalid(format!(
                            "node {} has a category set but feature {} is numeric",
                            i, feature
                        )));
                    }
                    Node::Categorical {
                        feature,
                        right_codes: codes.iter().copied().collect(),
                        left,
                        right,
                        default_left: schema.default_left[i],
                    }
                }
                None => {
                    if *kind != FeatureKind::Numeric {
                        return Err(invalid(format!(
                            "node {} uses a threshold on categorical feature {}",
                            i, feature
                        )));
                    }
                    ensure_finite(
                        format_args!("tree {} threshold {}", tree_idx, i),
                        schema.thresholds[i],
                    )?;
                    Node::Numeric {
                        feature,
                        threshold: schema.thresholds[i],
                        left,
                        right,
                    }
                }
            };
            nodes.push(node);
        }

        Ok(Self { nodes })
    }

    fn evaluate(
        &self,
        row: &[FeatureValue],
        vocabularies: &[Option<HashMap<String, u32>>],
    ) -> Result<f64, InferenceError> {
        let mut idx = 0;
        loop {
            idx = match &self.nodes[idx] {
                Node::Leaf(value) => return Ok(*value),
                Node::Numeric {
                    feature,
                    threshold,
                    left,
                    right,
                } => match &row[*feature] {
                    FeatureValue::Number(x) if *x < *threshold => *left,
                    FeatureValue::Number(_) => *right,
                    FeatureValue::Category(_) => {
                        return Err(InferenceError::WrongValueKind {
                            index: *feature,
                            expected: FeatureKind::Numeric,
                        })
                    }
                },
                Node::Categorical {
                    feature,
                    right_codes,
                    left,
                    right,
                    default_left,
                } => match &row[*feature] {
                    FeatureValue::Category(category) => {
                        let code = vocabularies[*feature]
                            .as_ref()
                            .and_then(|vocab| vocab.get(category));
                        match code {
                            Some(code) if right_codes.contains(code) => *right,
                            Some(_) => *left,
                            None if *default_left => *left,
                            None => *right,
                        }
                    }
                    FeatureValue::Number(_) => {
                        return Err(InferenceError::WrongValueKind {
                            index: *feature,
                            expected: FeatureKind::Categorical,
                        })
                    }
                },
            };
        }
    }
}

/// Sum (or mean) of tree outputs plus a base score.
#[derive(Debug, Clone)]
pub struct ForestPredictor {
    feature_names_in: Option<Vec<String>>,
    base_score: f64,
    average: bool,
    vocabularies: Vec<Option<HashMap<String, u32>>>,
    kinds: Vec<FeatureKind>,
    trees: Vec<Tree>,
    output: OutputTransform,
}

impl ForestPredictor {
    pub(crate) fn from_schema(schema: ForestSchema) -> LoadResult<Self> {
        check_input_width("forest", schema.n_features)?;
        if schema.trees.is_empty() {
            return Err(LoadError::InvalidPredictor {
                reason: "forest has no trees".to_string(),
            });
        }
        check_feature_names(schema.feature_names_in.as_ref(), schema.n_features)?;
        ensure_finite("base_score", schema.base_score)?;

        let mut vocabularies: Vec<Option<HashMap<String, u32>>> = vec![None; schema.n_features];
        for (feature, categories) in schema.categories {
            let slot = vocabularies
                .get_mut(feature)
                .ok_or_else(|| LoadError::InvalidPredictor {
                    reason: format!(
                        "categories given for feature {} but the forest takes {} inputs",
                        feature, schema.n_features
                    ),
                })?;
            let vocab = categories
                .into_iter()
                .enumerate()
                .map(|(code, category)| (category, code as u32))
                .collect();
            *slot = Some(vocab);
        }
        let kinds: Vec<FeatureKind> = vocabularies
            .iter()
            .map(|v| {
                if v.is_some() {
                    FeatureKind::Categorical
                } else {
                    FeatureKind::Numeric
                }
            })
            .collect();

        let trees = schema
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, tree)| Tree::from_schema(i, tree, &kinds))
            .collect::<LoadResult<Vec<_>>>()?;

        Ok(Self {
            feature_names_in: schema.feature_names_in,
            base_score: schema.base_score,
            average: schema.average,
            vocabularies,
            kinds,
            trees,
            output: schema.output_transform.into(),
        })
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names_in.as_deref()
    }

    pub fn input_kinds(&self) -> &[FeatureKind] {
        &self.kinds
    }

    /// Number of trees in the ensemble.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub(crate) fn predict_row(&self, row: &[FeatureValue]) -> Result<f64, InferenceError> {
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.evaluate(row, &self.vocabularies)?;
        }
        if self.average {
            total /= self.trees.len() as f64;
        }
        Ok(self.output.apply(self.base_score + total))
    }
}
