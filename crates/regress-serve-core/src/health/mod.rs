//! Health reporting for the prediction service.
//!
//! Health is derived from [`ServiceState`](crate::service::ServiceState) on
//! every call. Nothing is cached, so the report can never disagree with what
//! `predict` would do.
//!
//! # Health States
//!
//! | Service health | `status` | `model_loaded` | `error` |
//! |----------------|----------|----------------|---------|
//! | `Ready` | `ok` | `true` | `null` |
//! | `Degraded` | `degraded` | `false` | load error message |
//! | `Uninitialized` | `degraded` | `false` | `null` |

mod check;
mod checker;
mod status;


pub use check::HealthCheck;
pub use checker::HealthChecker;
pub use status::HealthStatus;
