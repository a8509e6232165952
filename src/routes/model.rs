use crate::{
    model::ModelStatus, rekognition::RekognitionService, routes::ApiError, server::SharedState,
};
use axum::{extract::State, response::Json};
use serde::Serialize;
use tracing::instrument;

#[derive(Serialize)]
pub struct LifecycleResponse {
    message: String,
    status: ModelStatus,
}

#[derive(Serialize)]
pub struct StatusResponse {
    status: ModelStatus,
}

#[instrument(skip(state))]
pub async fn start_model<R: RekognitionService>(
    State(state): State<SharedState<R>>,
) -> Result<Json<LifecycleResponse>, ApiError> {
    state.metrics.record_request("/start-model");
    let status = state.lifecycle.start().await?;
    Ok(Json(LifecycleResponse {
        message: "Model is starting...".into(),
        status,
    }))
}

#[instrument(skip(state))]
pub async fn stop_model<R: RekognitionService>(
    State(state): State<SharedState<R>>,
) -> Result<Json<LifecycleResponse>, ApiError> {
    state.metrics.record_request("/stop-model");
    let status = state.lifecycle.stop().await?;
    Ok(Json(LifecycleResponse {
        message: "Model is stopping...".into(),
        status,
    }))
}

#[instrument(skip(state))]
pub async fn check_model_status<R: RekognitionService>(
    State(state): State<SharedState<R>>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.metrics.record_request("/check-model-status");
    let status = state.lifecycle.status().await?;
    tracing::debug!("Model status is {}", status);
    Ok(Json(StatusResponse { status }))
}
