//! Router and request handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::debug;

use regress_serve_core::{
    HealthCheck, HealthChecker, PredictionRequest, PredictionResult, PredictionService,
    SharedServiceState,
};

use crate::error::ApiError;

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: PredictionService,
    pub health: HealthChecker,
}

impl AppState {
    #[must_use]
    pub fn new(state: SharedServiceState) -> Self {
        Self {
            service: PredictionService::new(state.clone()),
            health: HealthChecker::new(state),
        }
    }
}

/// Build the router with `/health` and `/predict`.
pub fn create_router(state: SharedServiceState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .with_state(AppState::new(state))
}

async fn health(State(app): State<AppState>) -> Json<HealthCheck> {
    Json(app.health.check())
}

/// Readiness is checked before the body so a degraded server answers 503
/// whatever was sent.
async fn predict(
    State(app): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    app.service.ensure_ready()?;

    let Json(request) = payload.map_err(|rejection| {
        debug!(error = %rejection, "Rejected prediction body");
        ApiError::from(rejection)
    })?;

    let result = app.service.predict(&request)?;
    Ok(Json(result))
}
