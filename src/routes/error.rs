use crate::{
    forwarder::ForwardError, images::ImageError, lifecycle::LifecycleError,
    rekognition::UpstreamError,
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) | ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            LifecycleError::ModelNotFound { .. } => ApiError::NotFound(err.to_string()),
            LifecycleError::Upstream(e) => ApiError::Upstream(e),
        }
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::InvalidReference(_) => ApiError::BadRequest(err.to_string()),
            ImageError::NotFound(_) => ApiError::NotFound("Image file not found".into()),
            ImageError::ReadFailed { .. } => {
                tracing::error!("{}", err);
                ApiError::Internal("Failed to read image file".into())
            }
        }
    }
}

impl From<ForwardError> for ApiError {
    fn from(err: ForwardError) -> Self {
        match err {
            ForwardError::Image(e) => e.into(),
            ForwardError::Upstream(e) => ApiError::Upstream(e),
            ForwardError::NoResults { .. } => ApiError::NotFound(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
