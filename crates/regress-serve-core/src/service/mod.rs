//! Prediction service.
//!
//! [`PredictionService::predict`] is the single operation of the serving
//! core:
//!
//! 1. Refuse with `ServiceUnavailable` unless the model is `Ready`
//! 2. Validate the request against the contract, collecting every problem
//! 3. Build the row in contract order and invoke the predictor
//! 4. Return the finite scalar, echoing bundle metadata
//!
//! Failures in step 3 are local to the call; the state is never touched.

mod request;
mod state;


use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ServiceError, ServiceResult};

pub use request::PredictionRequest;
pub use state::{LoadedModel, ServiceHealth, ServiceState, SharedServiceState};

/// Successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Always finite.
    pub prediction: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Validates requests and invokes the loaded predictor.
///
/// Cheap to clone; all clones share the same [`ServiceState`].
#[derive(Debug, Clone)]
pub struct PredictionService {
    state: SharedServiceState,
}

impl PredictionService {
    #[must_use]
    pub fn new(state: SharedServiceState) -> Self {
        Self { state }
    }

    #[must_use]
    pub fn state(&self) -> &SharedServiceState {
        &self.state
    }

    /// The loaded model, or `ServiceUnavailable`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::ServiceUnavailable`] when health is not `Ready`.
    pub fn ensure_ready(&self) -> ServiceResult<&LoadedModel> {
        self.state.model().ok_or(ServiceError::ServiceUnavailable)
    }

    /// Predict a single value.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::ServiceUnavailable`] if the model is not loaded
    /// - [`ServiceError::Validation`] listing all missing or mistyped features
    /// - [`ServiceError::Inference`] if the predictor fails on this row
    pub fn predict(&self, request: &PredictionRequest) -> ServiceResult<PredictionResult> {
        let model = self.ensure_ready()?;

        let row = request.to_row(model.contract()).map_err(|e| {
            debug!(error = %e, "Prediction request rejected");
            e
        })?;

        let prediction = model.predictor().predict(&row).map_err(|e| {
            warn!(error = %e, "Inference failed");
            e
        })?;

        debug!(prediction, "Prediction served");
        Ok(PredictionResult {
            prediction,
            metadata: model.metadata().cloned(),
        })
    }
}
