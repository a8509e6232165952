use crate::label::{CustomLabel, Label};
use crate::model::ModelStatus;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Failure class of an upstream call, derived from the AWS error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    Timeout,
    Transport,
    Throttled,
    AccessDenied,
    NotFound,
    Conflict,
    NotReady,
    InvalidRequest,
    Service,
}

impl UpstreamErrorKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            "ThrottlingException"
            | "ProvisionedThroughputExceededException"
            | "LimitExceededException"
            | "ServiceQuotaExceededException" => UpstreamErrorKind::Throttled,
            "AccessDeniedException" | "UnrecognizedClientException" | "ExpiredTokenException" => {
                UpstreamErrorKind::AccessDenied
            }
            "ResourceNotFoundException" => UpstreamErrorKind::NotFound,
            "ResourceInUseException" => UpstreamErrorKind::Conflict,
            "ResourceNotReadyException" => UpstreamErrorKind::NotReady,
            "InvalidParameterException"
            | "InvalidImageFormatException"
            | "ImageTooLargeException"
            | "ValidationException" => UpstreamErrorKind::InvalidRequest,
            _ => UpstreamErrorKind::Service,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamErrorKind::Timeout => "timeout",
            UpstreamErrorKind::Transport => "transport failure",
            UpstreamErrorKind::Throttled => "throttled or over quota",
            UpstreamErrorKind::AccessDenied => "access denied",
            UpstreamErrorKind::NotFound => "resource not found",
            UpstreamErrorKind::Conflict => "resource in use",
            UpstreamErrorKind::NotReady => "model not ready",
            UpstreamErrorKind::InvalidRequest => "invalid request",
            UpstreamErrorKind::Service => "service error",
        }
    }
}

impl fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone)]
#[error("{operation} failed ({kind}): {message}")]
pub struct UpstreamError {
    pub operation: &'static str,
    pub kind: UpstreamErrorKind,
    pub message: String,
}

impl UpstreamError {
    pub fn new(
        operation: &'static str,
        kind: UpstreamErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
        }
    }
}

/// The slice of the Rekognition API this service depends on.
#[async_trait]
pub trait RekognitionService: Send + Sync + Clone + 'static {
    async fn start_project_version(
        &self,
        version_arn: &str,
        min_inference_units: i32,
    ) -> Result<ModelStatus, UpstreamError>;

    async fn stop_project_version(&self, version_arn: &str) -> Result<ModelStatus, UpstreamError>;

    /// Statuses of the matching project versions, most recent first.
    async fn describe_project_versions(
        &self,
        project_arn: &str,
        version_name: &str,
    ) -> Result<Vec<ModelStatus>, UpstreamError>;

    async fn detect_labels(
        &self,
        image: Vec<u8>,
        max_labels: i32,
    ) -> Result<Vec<Label>, UpstreamError>;

    async fn detect_custom_labels(
        &self,
        version_arn: &str,
        image: Vec<u8>,
        min_confidence: f32,
    ) -> Result<Vec<CustomLabel>, UpstreamError>;
}
