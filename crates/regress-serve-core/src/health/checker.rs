//! Health checker service.

use crate::service::{ServiceHealth, SharedServiceState};

use super::check::HealthCheck;
use super::status::HealthStatus;

/// Produces [`HealthCheck`] reports from the shared service state.
///
/// Cheap to clone and safe to call from any number of handlers.
#[derive(Debug, Clone)]
pub struct HealthChecker {
    state: SharedServiceState,
}

impl HealthChecker {
    #[must_use]
    pub fn new(state: SharedServiceState) -> Self {
        Self { state }
    }

    /// Quick status without allocating.
    #[must_use]
    pub fn status(&self) -> HealthStatus {
        match self.state.health() {
            ServiceHealth::Ready => HealthStatus::Ok,
            ServiceHealth::Degraded | ServiceHealth::Uninitialized => HealthStatus::Degraded,
        }
    }

    /// Full health report.
    #[must_use]
    pub fn check(&self) -> HealthCheck {
        let status = self.status();
        HealthCheck {
            status,
            model_loaded: status.is_ok(),
            model_path: self.state.model_path().to_string(),
            error: self.state.load_error().map(ToString::to_string),
            health: self.state.health(),
        }
    }
}
