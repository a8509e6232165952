use crate::{
    forwarder::ImageLabels,
    label::Label,
    rekognition::RekognitionService,
    routes::ApiError,
    server::SharedState,
};
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct ProcessImageRequest {
    #[serde(default)]
    image_path: Option<String>,
}

#[derive(Serialize)]
pub struct ProcessImageResponse {
    labels: Vec<Label>,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    images: Vec<String>,
}

#[derive(Serialize)]
pub struct BatchResponse {
    results: Vec<ImageLabels>,
}

#[instrument(skip(state))]
pub async fn process_image<R: RekognitionService>(
    State(state): State<SharedState<R>>,
    Json(request): Json<ProcessImageRequest>,
) -> Result<Json<ProcessImageResponse>, ApiError> {
    state.metrics.record_request("/process-image");

    let image_path = request
        .image_path
        .filter(|path| !path.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("No image path provided".into()))?;

    let labels = state.forwarder.detect_labels(&image_path).await?;
    Ok(Json(ProcessImageResponse { labels }))
}

#[instrument(skip_all, fields(images = request.images.len()))]
pub async fn send_to_rekognition<R: RekognitionService>(
    State(state): State<SharedState<R>>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    state.metrics.record_request("/api/send-to-rekognition");

    if request.images.is_empty() {
        return Err(ApiError::BadRequest("No images provided".into()));
    }

    let results = state.forwarder.detect_custom_labels(&request.images).await?;
    Ok(Json(BatchResponse { results }))
}
