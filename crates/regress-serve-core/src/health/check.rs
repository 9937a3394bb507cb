//! Health check result.

use serde::Serialize;

use crate::service::ServiceHealth;

use super::status::HealthStatus;

/// Point-in-time health report, serialized as the `/health` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthCheck {
    pub status: HealthStatus,

    /// `true` iff `status` is `ok`.
    pub model_loaded: bool,

    /// Configured artifact path.
    pub model_path: String,

    /// Load failure message when degraded after a failed load.
    pub error: Option<String>,

    /// Lifecycle state the report was derived from.
    #[serde(skip)]
    pub health: ServiceHealth,
}

impl HealthCheck {
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }
}
