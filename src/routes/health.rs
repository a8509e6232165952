use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct Status {
    status: String,
}

#[derive(Serialize, Deserialize)]
pub struct Message {
    message: String,
}

pub async fn root() -> impl IntoResponse {
    Json(Message {
        message: "Rekognition proxy is running!".into(),
    })
}

pub async fn healthcheck() -> impl IntoResponse {
    Json(Status {
        status: "Available".into(),
    })
}
