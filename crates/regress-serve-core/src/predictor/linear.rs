//! Additive linear model with standardized numeric columns and one-hot
//! categorical columns.

use std::collections::BTreeMap;

use crate::artifact::schema::{ColumnSchema, HandleUnknownSchema, LinearSchema};
use crate::contract::FeatureKind;
use crate::error::{InferenceError, LoadError, LoadResult};

use super::{
    check_feature_names, check_input_width, ensure_finite, FeatureValue, OutputTransform,
};

#[derive(Debug, Clone)]
enum Column {
    Numeric {
        coefficient: f64,
        center: f64,
        scale: f64,
    },
    Categorical {
        weights: BTreeMap<String, f64>,
        reject_unknown: bool,
    },
}

/// `intercept + sum(column_i(x_i))`, then the output transform.
#[derive(Debug, Clone)]
pub struct LinearPredictor {
    feature_names_in: Option<Vec<String>>,
    intercept: f64,
    columns: Vec<Column>,
    kinds: Vec<FeatureKind>,
    output: OutputTransform,
}

impl LinearPredictor {
    pub(crate) fn from_schema(schema: LinearSchema) -> LoadResult<Self> {
        check_input_width("linear model", schema.columns.len())?;
        check_feature_names(schema.feature_names_in.as_ref(), schema.columns.len())?;
        ensure_finite("intercept", schema.intercept)?;

        let mut columns = Vec::with_capacity(schema.columns.len());
        let mut kinds = Vec::with_capacity(schema.columns.len());
        for (i, column) in schema.columns.into_iter().enumerate() {
            match column {
                ColumnSchema::Numeric {
                    coefficient,
                    center,
                    scale,
                } => {
                    ensure_finite(format_args!("column {} coefficient", i), coefficient)?;
                    ensure_finite(format_args!("column {} center", i), center)?;
                    ensure_finite(format_args!("column {} scale", i), scale)?;
                    if scale == 0.0 {
                        return Err(LoadError::InvalidPredictor {
                            reason: format!("column {} scale is zero", i),
                        });
                    }
                    columns.push(Column::Numeric {
                        coefficient,
                        center,
                        scale,
                    });
                    kinds.push(FeatureKind::Numeric);
                }
                ColumnSchema::Categorical {
                    weights,
                    handle_unknown,
                } => {
                    for (category, weight) in &weights {
                        ensure_finite(format_args!("column {} weight {:?}", i, category), *weight)?;
                    }
                    columns.push(Column::Categorical {
                        weights,
                        reject_unknown: handle_unknown == HandleUnknownSchema::Error,
                    });
                    kinds.push(FeatureKind::Categorical);
                }
            }
        }

        Ok(Self {
            feature_names_in: schema.feature_names_in,
            intercept: schema.intercept,
            columns,
            kinds,
            output: schema.output_transform.into(),
        })
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names_in.as_deref()
    }

    pub fn input_kinds(&self) -> &[FeatureKind] {
        &self.kinds
    }

    pub(crate) fn predict_row(&self, row: &[FeatureValue]) -> Result<f64, InferenceError> {
        let mut sum = self.intercept;
        for (index, (column, value)) in self.columns.iter().zip(row).enumerate() {
            sum += match (column, value) {
                (
                    Column::Numeric {
                        coefficient,
                        center,
                        scale,
                    },
                    FeatureValue::Number(x),
                ) => coefficient * (x - center) / scale,
                (
                    Column::Categorical {
                        weights,
                        reject_unknown,
                    },
                    FeatureValue::Category(category),
                ) => match weights.get(category) {
                    Some(weight) => *weight,
                    None if *reject_unknown => {
                        return Err(InferenceError::UnknownCategory {
                            index,
                            category: category.clone(),
                        })
                    }
                    None => 0.0,
                },
                _ => {
                    return Err(InferenceError::WrongValueKind {
                        index,
                        expected: self.kinds[index],
                    })
                }
            };
        }
        Ok(self.output.apply(sum))
    }
}
