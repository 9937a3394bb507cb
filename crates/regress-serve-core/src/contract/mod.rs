//! Feature contract resolution.
//!
//! The contract is the ordered, typed list of features a request must
//! supply. It is resolved exactly once per process from the loaded artifact
//! and never changes afterwards.
//!
//! # Resolution Precedence
//!
//! | Step | Source | [`ContractSource`] |
//! |------|--------|--------------------|
//! | 1 | Non-empty `contract.features` declared in a bundle | `Declared` |
//! | 2 | `feature_names_in` recorded on the predictor | `Introspected` |
//! | 3 | [`DEFAULT_FEATURES`] | `Default` |
//!
//! Feature types are taken from the predictor's input kinds when the widths
//! agree, otherwise from the declaration, otherwise from the default table,
//! otherwise numeric. A declared type that contradicts the predictor is
//! overridden with a warning, since no request could satisfy it.


use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::artifact::schema::RawContract;
use crate::predictor::Predictor;

/// Last-resort feature list for artifacts that carry no contract and no
/// introspectable names.
pub const DEFAULT_FEATURES: [(&str, FeatureKind); 9] = [
    ("Acceleration", FeatureKind::Numeric),
    ("TopSpeed_KmH", FeatureKind::Numeric),
    ("Range_Km", FeatureKind::Numeric),
    ("Battery_kWh", FeatureKind::Numeric),
    ("Efficiency_WhKm", FeatureKind::Numeric),
    ("FastCharge_kW", FeatureKind::Numeric),
    ("Seats", FeatureKind::Numeric),
    ("PriceEuro", FeatureKind::Numeric),
    ("PowerTrain", FeatureKind::Categorical),
];

/// Value type a feature accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

impl FeatureKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a resolved contract came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractSource {
    Declared,
    Introspected,
    Default,
}

impl ContractSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Declared => "declared",
            Self::Introspected => "introspected",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for ContractSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSpec {
    pub name: String,
    pub kind: FeatureKind,
}

/// Ordered, typed input contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureContract {
    features: Vec<FeatureSpec>,
    source: ContractSource,
}

impl FeatureContract {
    #[must_use]
    pub fn new(features: Vec<FeatureSpec>, source: ContractSource) -> Self {
        Self { features, source }
    }

    #[must_use]
    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name.as_str())
    }

    #[must_use]
    pub fn source(&self) -> ContractSource {
        self.source
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Derives the [`FeatureContract`] for a loaded predictor.
pub struct FeatureContractResolver;

impl FeatureContractResolver {
    /// Resolve the contract. Pure and deterministic: the same inputs always
    /// yield the same ordered list.
    #[must_use]
    pub fn resolve(predictor: &Predictor, raw: Option<&RawContract>) -> FeatureContract {
        let input_kinds = predictor.input_kinds();

        if let Some(raw) = raw.filter(|r| !r.features.is_empty()) {
            let mut seen = HashSet::with_capacity(raw.features.len());
            let declared: Vec<_> = raw
                .features
                .iter()
                .filter(|f| {
                    let first = seen.insert(f.name());
                    if !first {
                        warn!(feature = f.name(), "Duplicate declared feature ignored");
                    }
                    first
                })
                .collect();
            let positional = declared.len() == input_kinds.len();
            let features = declared
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    let model_kind = positional.then(|| input_kinds[i]);
                    let kind = match (f.declared_kind(), model_kind) {
                        (Some(declared), Some(model)) if declared != model => {
                            warn!(
                                feature = f.name(),
                                declared = %declared,
                                model = %model,
                                "Declared feature type contradicts the model input; using the model's"
                            );
                            model
                        }
                        (Some(declared), _) => declared,
                        (None, Some(model)) => model,
                        (None, None) => default_kind(f.name()).unwrap_or(FeatureKind::Numeric),
                    };
                    FeatureSpec {
                        name: f.name().to_string(),
                        kind,
                    }
                })
                .collect();
            return FeatureContract::new(features, ContractSource::Declared);
        }

        if let Some(names) = predictor.feature_names().filter(|n| !n.is_empty()) {
            // Construction guarantees names.len() == input width.
            let features = names
                .iter()
                .zip(input_kinds)
                .map(|(name, kind)| FeatureSpec {
                    name: name.clone(),
                    kind: *kind,
                })
                .collect();
            return FeatureContract::new(features, ContractSource::Introspected);
        }

        let positional = DEFAULT_FEATURES.len() == input_kinds.len();
        let features = DEFAULT_FEATURES
            .iter()
            .enumerate()
            .map(|(i, (name, kind))| FeatureSpec {
                name: (*name).to_string(),
                kind: if positional { input_kinds[i] } else { *kind },
            })
            .collect();
        FeatureContract::new(features, ContractSource::Default)
    }
}

fn default_kind(name: &str) -> Option<FeatureKind> {
    DEFAULT_FEATURES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, kind)| *kind)
}
