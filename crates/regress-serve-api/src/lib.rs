//! HTTP surface for regress-serve.
//!
//! # Endpoints
//!
//! | Method | Path | Success | Failures |
//! |--------|------|---------|----------|
//! | GET | `/health` | 200 with the health report | none |
//! | POST | `/predict` | 200 `{"prediction": ...}` | 503 model not loaded, 422 invalid input, 500 inference |
//!
//! Every error body has the shape `{"detail": "<message>"}`.

pub mod error;
pub mod routes;
pub mod server;
pub mod telemetry;

pub use error::ApiError;
pub use routes::{create_router, AppState};
pub use server::{bind, serve};
