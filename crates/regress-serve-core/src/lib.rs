//! regress-serve core library
//!
//! Loads a serialized regression model once and serves single-row
//! predictions against a resolved feature contract.
//!
//! # Architecture
//!
//! - [`artifact`]: reads the JSON artifact and classifies it as a bare
//!   predictor or a bundle with contract and metadata
//! - [`predictor`]: linear and tree-ensemble evaluators over typed rows
//! - [`contract`]: resolves the ordered, typed feature list
//! - [`service`]: process-wide state and the predict operation
//! - [`health`]: health reports derived from the service state
//! - [`config`]: layered configuration for the server binary
//!
//! # Example
//!
//! ```
//! use regress_serve_core::artifact::ModelArtifact;
//! use regress_serve_core::service::{PredictionRequest, PredictionService, ServiceState};
//! use regress_serve_core::artifact::LoadOutcome;
//! use serde_json::json;
//!
//! let artifact = ModelArtifact::from_value(json!({
//!     "kind": "linear",
//!     "feature_names_in": ["Seats"],
//!     "intercept": 1.0,
//!     "columns": [{"type": "numeric", "coefficient": 2.0}]
//! }))
//! .unwrap();
//! let outcome = LoadOutcome::Ready { artifact, checksum: String::new() };
//! let service = PredictionService::new(ServiceState::from_outcome("inline", outcome).into_shared());
//!
//! let request: PredictionRequest = serde_json::from_value(json!({"Seats": 5})).unwrap();
//! assert_eq!(service.predict(&request).unwrap().prediction, 11.0);
//! ```

pub mod artifact;
pub mod config;
pub mod contract;
pub mod error;
pub mod health;
pub mod predictor;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

// Re-exports for convenience
pub use artifact::{ArtifactLoader, LoadOutcome, ModelArtifact};
pub use config::ServeConfig;
pub use contract::{FeatureContract, FeatureContractResolver, FeatureKind};
pub use error::{ConfigError, InferenceError, LoadError, ServiceError, ServiceResult, ValidationError};
pub use health::{HealthCheck, HealthChecker, HealthStatus};
pub use predictor::{FeatureValue, Predictor};
pub use service::{
    PredictionRequest, PredictionResult, PredictionService, ServiceHealth, ServiceState,
    SharedServiceState,
};
