//! Artifact loading.
//!
//! Reads the artifact file once, classifies its shape and extracts the
//! predictor. This is the only module that inspects the raw document; the
//! rest of the crate works with the tagged [`ModelArtifact`].
//!
//! # Shapes
//!
//! | Shape | Recognised by | Carries |
//! |-------|---------------|---------|
//! | `SinglePredictor` | top-level `kind` tag | predictor |
//! | `BundleWithContract` | first of [`PREDICTOR_ALIAS_KEYS`] present | predictor, optional `contract`, optional `metadata` |
//!
//! # Failure
//!
//! [`ArtifactLoader::load`] never panics and never returns `Err`: every
//! failure is folded into [`LoadOutcome::Failed`] so startup can continue in
//! a degraded state.

pub mod schema;


use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{error, info};

use crate::error::{LoadError, LoadResult};
use crate::predictor::Predictor;

use schema::{PredictorSchema, RawContract};

/// Keys under which a bundle may store its predictor, in search order.
pub const PREDICTOR_ALIAS_KEYS: [&str; 5] =
    ["model", "pipeline", "estimator", "regressor", "predictor"];

/// Tag that marks a document as a bare predictor.
pub const PREDICTOR_TAG: &str = "kind";

pub const CONTRACT_KEY: &str = "contract";
pub const METADATA_KEY: &str = "metadata";

/// A classified artifact.
#[derive(Debug, Clone)]
pub enum ModelArtifact {
    /// The document is the predictor itself.
    SinglePredictor(Predictor),
    /// The document packages a predictor with optional contract and metadata.
    BundleWithContract {
        predictor: Predictor,
        contract: Option<RawContract>,
        metadata: Option<Value>,
    },
}

impl ModelArtifact {
    /// Classify a parsed document.
    ///
    /// # Errors
    ///
    /// - [`LoadError::UnrecognizedShape`] if `doc` is not an object
    /// - [`LoadError::NoPredictorKey`] for a bundle without any alias key
    /// - [`LoadError::InvalidPredictor`] / [`LoadError::InvalidContract`] for
    ///   malformed sub-documents
    pub fn from_value(doc: Value) -> LoadResult<Self> {
        let mut map = match doc {
            Value::Object(map) => map,
            other => {
                return Err(LoadError::UnrecognizedShape {
                    found: json_type_name(&other),
                })
            }
        };

        if map.contains_key(PREDICTOR_TAG) {
            return Ok(Self::SinglePredictor(parse_predictor(Value::Object(map))?));
        }

        let Some(key) = PREDICTOR_ALIAS_KEYS
            .iter()
            .copied()
            .find(|k| map.contains_key(*k))
        else {
            return Err(LoadError::NoPredictorKey {
                expected: PREDICTOR_ALIAS_KEYS.iter().map(|k| k.to_string()).collect(),
                found: map.keys().cloned().collect(),
            });
        };

        let predictor = parse_predictor(map.remove(key).unwrap_or(Value::Null))?;
        let contract = match map.remove(CONTRACT_KEY) {
            None | Some(Value::Null) => None,
            Some(raw) => Some(serde_json::from_value::<RawContract>(raw).map_err(|e| {
                LoadError::InvalidContract {
                    reason: e.to_string(),
                }
            })?),
        };
        let metadata = map.remove(METADATA_KEY).filter(|m| !m.is_null());

        Ok(Self::BundleWithContract {
            predictor,
            contract,
            metadata,
        })
    }

    #[must_use]
    pub fn predictor(&self) -> &Predictor {
        match self {
            Self::SinglePredictor(p) | Self::BundleWithContract { predictor: p, .. } => p,
        }
    }

    #[must_use]
    pub fn raw_contract(&self) -> Option<&RawContract> {
        match self {
            Self::SinglePredictor(_) => None,
            Self::BundleWithContract { contract, .. } => contract.as_ref(),
        }
    }

    #[must_use]
    pub fn shape_name(&self) -> &'static str {
        match self {
            Self::SinglePredictor(_) => "single_predictor",
            Self::BundleWithContract { .. } => "bundle",
        }
    }

    /// Split into predictor, declared contract and metadata.
    #[must_use]
    pub fn into_parts(self) -> (Predictor, Option<RawContract>, Option<Value>) {
        match self {
            Self::SinglePredictor(p) => (p, None, None),
            Self::BundleWithContract {
                predictor,
                contract,
                metadata,
            } => (predictor, contract, metadata),
        }
    }
}

/// Result of the one-time load attempt.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Ready {
        artifact: ModelArtifact,
        /// Hex SHA-256 of the artifact bytes.
        checksum: String,
    },
    Failed(LoadError),
}

impl LoadOutcome {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Loads the artifact at a configured path.
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    path: PathBuf,
}

impl ArtifactLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read, parse and classify the artifact. Deterministic for identical
    /// file contents; performs no retries.
    pub fn load(&self) -> LoadOutcome {
        let start = Instant::now();
        match self.try_load() {
            Ok((artifact, checksum)) => {
                info!(
                    path = %self.path.display(),
                    shape = artifact.shape_name(),
                    predictor = artifact.predictor().kind_name(),
                    inputs = artifact.predictor().n_inputs(),
                    sha256 = %checksum,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Model artifact loaded"
                );
                LoadOutcome::Ready { artifact, checksum }
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Model artifact failed to load");
                LoadOutcome::Failed(e)
            }
        }
    }

    fn try_load(&self) -> LoadResult<(ModelArtifact, String)> {
        let path = self.path.display().to_string();
        let bytes = fs::read(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LoadError::ArtifactMissing { path: path.clone() },
            _ => LoadError::ArtifactUnreadable {
                path: path.clone(),
                reason: e.to_string(),
            },
        })?;
        let checksum = format!("{:x}", Sha256::digest(&bytes));

        let doc: Value = serde_json::from_slice(&bytes).map_err(|e| LoadError::Deserialization {
            path,
            reason: e.to_string(),
        })?;

        Ok((ModelArtifact::from_value(doc)?, checksum))
    }
}

fn parse_predictor(doc: Value) -> LoadResult<Predictor> {
    if !doc.is_object() {
        return Err(LoadError::InvalidPredictor {
            reason: format!("predictor must be an object, found {}", json_type_name(&doc)),
        });
    }
    let schema: PredictorSchema =
        serde_json::from_value(doc).map_err(|e| LoadError::InvalidPredictor {
            reason: e.to_string(),
        })?;
    Predictor::from_schema(schema)
}

/// JSON type name used in error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
