mod detection;
mod error;
mod health;
mod metrics;
mod model;

pub use error::ApiError;

use crate::{rekognition::RekognitionService, server::SharedState};
use axum::{
    routing::{get, post},
    Router,
};

pub fn api_routes<R: RekognitionService>() -> Router<SharedState<R>> {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::healthcheck))
        .route("/metrics", get(metrics::metrics_handler::<R>))
        .route("/start-model", get(model::start_model::<R>))
        .route("/stop-model", get(model::stop_model::<R>))
        .route("/check-model-status", get(model::check_model_status::<R>))
        .route("/process-image", post(detection::process_image::<R>))
        .route(
            "/api/send-to-rekognition",
            post(detection::send_to_rekognition::<R>),
        )
}
