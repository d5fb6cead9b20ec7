use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use validator::Validate;

use super::error::ApiError;
use crate::{
    calculator::WindowDebugReport,
    controller::AppState,
    domain::{CalculationBatch, WindowCalculationResult},
    resolver::ResolvedConfig,
    state::EntityState,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/windows", get(latest_results))
        .route("/calculate", post(calculate_now))
        .route("/windows/:id", get(calculate_window))
        .route("/windows/:id/config", get(window_config))
        .route("/windows/:id/debug", get(window_debug))
        .route("/sensors/:entity_id", put(update_sensor))
        .with_state(state)
}

pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

/// Latest batch produced by the calculation loop.
pub async fn latest_results(
    State(st): State<AppState>,
) -> Result<Json<CalculationBatch>, ApiError> {
    st.controller
        .latest()
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("no calculation cycle has completed yet".to_string()))
}

pub async fn calculate_now(State(st): State<AppState>) -> Json<CalculationBatch> {
    Json(st.controller.run_cycle().await)
}

pub async fn calculate_window(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WindowCalculationResult>, ApiError> {
    Ok(Json(st.controller.calculate_window(&id)?))
}

pub async fn window_config(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResolvedConfig>, ApiError> {
    Ok(Json(st.controller.resolve(&id)?))
}

/// Raw layers, effective config, snapshot and result for one window.
pub async fn window_debug(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WindowDebugReport>, ApiError> {
    Ok(Json(st.controller.debug_window(&id)?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SensorUpdate {
    #[validate(length(min = 1, max = 255))]
    pub state: String,
    pub attributes: Option<BTreeMap<String, Value>>,
}

pub async fn update_sensor(
    State(st): State<AppState>,
    Path(entity_id): Path<String>,
    Json(update): Json<SensorUpdate>,
) -> Result<Json<EntityState>, ApiError> {
    update.validate()?;
    if entity_id.trim().is_empty() {
        return Err(ApiError::BadRequest("entity id must not be empty".to_string()));
    }
    let entry = st
        .controller
        .states
        .set_state(entity_id, update.state, update.attributes);
    Ok(Json(entry))
}
