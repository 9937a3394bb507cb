//! Process-wide service state.
//!
//! Built exactly once at startup from the load outcome and shared read-only
//! afterwards. There is no setter: moving from `Degraded` to `Ready`
//! requires a process restart with a corrected artifact.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::artifact::{ArtifactLoader, LoadOutcome};
use crate::contract::{FeatureContract, FeatureContractResolver};
use crate::error::LoadError;
use crate::predictor::Predictor;

/// Lifecycle of the model slot.
///
/// ```text
/// Uninitialized --(single load attempt)--> Ready | Degraded
/// ```
///
/// `Ready` and `Degraded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceHealth {
    Uninitialized,
    Ready,
    Degraded,
}

impl ServiceHealth {
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Degraded => "degraded",
        }
    }
}

impl std::fmt::Display for ServiceHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successfully loaded model together with its resolved contract.
#[derive(Debug)]
pub struct LoadedModel {
    predictor: Predictor,
    contract: FeatureContract,
    metadata: Option<Value>,
    checksum: String,
}

impl LoadedModel {
    #[must_use]
    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    #[must_use]
    pub fn contract(&self) -> &FeatureContract {
        &self.contract
    }

    /// Bundle metadata echoed with every prediction.
    #[must_use]
    pub fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }

    /// Hex SHA-256 of the artifact file.
    #[must_use]
    pub fn checksum(&self) -> &str {
        &self.checksum
    }
}

#[derive(Debug)]
enum ModelSlot {
    Uninitialized,
    Ready(LoadedModel),
    Degraded(LoadError),
}

/// Immutable state shared by every request handler.
#[derive(Debug)]
pub struct ServiceState {
    model_path: String,
    slot: ModelSlot,
}

/// Shared handle to the service state.
pub type SharedServiceState = Arc<ServiceState>;

impl ServiceState {
    /// State before the load attempt. Predictions are refused.
    pub fn uninitialized(model_path: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            slot: ModelSlot::Uninitialized,
        }
    }

    /// Load the artifact at `model_path` and resolve its contract.
    ///
    /// Blocking. Never fails: a load failure yields a `Degraded` state.
    pub fn initialize(model_path: impl AsRef<Path>) -> Self {
        let model_path = model_path.as_ref();
        let outcome = ArtifactLoader::new(model_path).load();
        Self::from_outcome(model_path.display().to_string(), outcome)
    }

    /// Build the state from an already performed load attempt.
    pub fn from_outcome(model_path: impl Into<String>, outcome: LoadOutcome) -> Self {
        let model_path = model_path.into();
        let slot = match outcome {
            LoadOutcome::Ready { artifact, checksum } => {
                let (predictor, raw_contract, metadata) = artifact.into_parts();
                let contract = FeatureContractResolver::resolve(&predictor, raw_contract.as_ref());
                if contract.len() != predictor.n_inputs() {
                    warn!(
                        contract_features = contract.len(),
                        model_inputs = predictor.n_inputs(),
                        "Contract width differs from model input width; predictions will fail"
                    );
                }
                info!(
                    source = %contract.source(),
                    features = ?contract.names().collect::<Vec<_>>(),
                    "Feature contract resolved"
                );
                ModelSlot::Ready(LoadedModel {
                    predictor,
                    contract,
                    metadata,
                    checksum,
                })
            }
            LoadOutcome::Failed(e) => {
                warn!(path = %model_path, error = %e, "Serving in degraded mode");
                ModelSlot::Degraded(e)
            }
        };
        Self { model_path, slot }
    }

    #[must_use]
    pub fn into_shared(self) -> SharedServiceState {
        Arc::new(self)
    }

    #[must_use]
    pub fn health(&self) -> ServiceHealth {
        match self.slot {
            ModelSlot::Uninitialized => ServiceHealth::Uninitialized,
            ModelSlot::Ready(_) => ServiceHealth::Ready,
            ModelSlot::Degraded(_) => ServiceHealth::Degraded,
        }
    }

    #[must_use]
    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    #[must_use]
    pub fn model(&self) -> Option<&LoadedModel> {
        match &self.slot {
            ModelSlot::Ready(model) => Some(model),
            _ => None,
        }
    }

    #[must_use]
    pub fn contract(&self) -> Option<&FeatureContract> {
        self.model().map(LoadedModel::contract)
    }

    #[must_use]
    pub fn load_error(&self) -> Option<&LoadError> {
        match &self.slot {
            ModelSlot::Degraded(e) => Some(e),
            _ => None,
        }
    }
}
