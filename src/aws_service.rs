use crate::config::RekognitionConfig;
use crate::label::{BoundingBox, CustomLabel, Geometry, Instance, Label, LabelName, Point};
use crate::model::ModelStatus;
use crate::rekognition::{RekognitionService, UpstreamError, UpstreamErrorKind};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_rekognition::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_rekognition::primitives::Blob;
use aws_sdk_rekognition::types::{self, Image};
use aws_sdk_rekognition::Client;
use std::error::Error;
use std::fmt::Debug;
use tracing::instrument;

/// Rekognition client built once at startup and cloned into every component.
#[derive(Clone, Debug)]
pub struct AwsRekognition {
    client: Client,
}

impl AwsRekognition {
    pub async fn new(config: &RekognitionConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(config.get_timeout())
                    .build(),
            )
            .retry_config(RetryConfig::standard().with_max_attempts(config.max_attempts));

        if let Some(ref profile) = config.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(ref endpoint_url) = config.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        let aws_config = loader.load().await;
        tracing::info!(
            "Rekognition client ready for region {} (timeout {}ms, {} attempts)",
            config.region,
            config.timeout_ms,
            config.max_attempts
        );

        Self {
            client: Client::new(&aws_config),
        }
    }
}

fn upstream_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> UpstreamError
where
    E: ProvideErrorMetadata + Error + Send + Sync + 'static,
    R: Debug,
{
    let kind = match &err {
        SdkError::TimeoutError(_) => UpstreamErrorKind::Timeout,
        SdkError::DispatchFailure(_) => UpstreamErrorKind::Transport,
        _ => err
            .code()
            .map(UpstreamErrorKind::from_code)
            .unwrap_or(UpstreamErrorKind::Service),
    };
    let message = match err.message() {
        Some(message) => message.to_string(),
        None => DisplayErrorContext(&err).to_string(),
    };
    tracing::error!("{} failed ({}): {}", operation, kind, message);
    UpstreamError::new(operation, kind, message)
}

fn image_from_bytes(bytes: Vec<u8>) -> Image {
    Image::builder().bytes(Blob::new(bytes)).build()
}

fn convert_bounding_box(bbox: &types::BoundingBox) -> BoundingBox {
    BoundingBox {
        width: bbox.width.unwrap_or_default(),
        height: bbox.height.unwrap_or_default(),
        left: bbox.left.unwrap_or_default(),
        top: bbox.top.unwrap_or_default(),
    }
}

fn label_names<T>(items: Option<Vec<T>>, name: impl Fn(T) -> Option<String>) -> Vec<LabelName> {
    items
        .unwrap_or_default()
        .into_iter()
        .filter_map(name)
        .map(LabelName::new)
        .collect()
}

fn convert_label(label: types::Label) -> Label {
    Label {
        name: label.name.unwrap_or_default(),
        confidence: label.confidence.unwrap_or_default(),
        instances: label
            .instances
            .unwrap_or_default()
            .into_iter()
            .map(|instance| Instance {
                bounding_box: instance.bounding_box.as_ref().map(convert_bounding_box),
                confidence: instance.confidence.unwrap_or_default(),
            })
            .collect(),
        parents: label_names(label.parents, |parent| parent.name),
        aliases: label_names(label.aliases, |alias| alias.name),
        categories: label_names(label.categories, |category| category.name),
    }
}

fn convert_custom_label(label: types::CustomLabel) -> CustomLabel {
    CustomLabel {
        name: label.name.unwrap_or_default(),
        confidence: label.confidence.unwrap_or_default(),
        geometry: label.geometry.map(|geometry| Geometry {
            bounding_box: geometry.bounding_box.as_ref().map(convert_bounding_box),
            polygon: geometry
                .polygon
                .unwrap_or_default()
                .into_iter()
                .map(|point| Point {
                    x: point.x.unwrap_or_default(),
                    y: point.y.unwrap_or_default(),
                })
                .collect(),
        }),
    }
}

fn convert_status(status: Option<&types::ProjectVersionStatus>) -> ModelStatus {
    status
        .map(|status| ModelStatus::from(status.as_str()))
        .unwrap_or_else(|| ModelStatus::Unknown(String::new()))
}

#[async_trait]
impl RekognitionService for AwsRekognition {
    #[instrument(skip(self))]
    async fn start_project_version(
        &self,
        version_arn: &str,
        min_inference_units: i32,
    ) -> Result<ModelStatus, UpstreamError> {
        let output = self
            .client
            .start_project_version()
            .project_version_arn(version_arn)
            .min_inference_units(min_inference_units)
            .send()
            .await
            .map_err(|e| upstream_error("StartProjectVersion", e))?;

        Ok(convert_status(output.status.as_ref()))
    }

    #[instrument(skip(self))]
    async fn stop_project_version(&self, version_arn: &str) -> Result<ModelStatus, UpstreamError> {
        let output = self
            .client
            .stop_project_version()
            .project_version_arn(version_arn)
            .send()
            .await
            .map_err(|e| upstream_error("StopProjectVersion", e))?;

        Ok(convert_status(output.status.as_ref()))
    }

    #[instrument(skip(self))]
    async fn describe_project_versions(
        &self,
        project_arn: &str,
        version_name: &str,
    ) -> Result<Vec<ModelStatus>, UpstreamError> {
        let output = self
            .client
            .describe_project_versions()
            .project_arn(project_arn)
            .version_names(version_name)
            .send()
            .await
            .map_err(|e| upstream_error("DescribeProjectVersions", e))?;

        let statuses = output
            .project_version_descriptions
            .unwrap_or_default()
            .iter()
            .map(|description| convert_status(description.status.as_ref()))
            .collect();

        Ok(statuses)
    }

    #[instrument(skip(self, image), fields(image_bytes = image.len()))]
    async fn detect_labels(
        &self,
        image: Vec<u8>,
        max_labels: i32,
    ) -> Result<Vec<Label>, UpstreamError> {
        let output = self
            .client
            .detect_labels()
            .image(image_from_bytes(image))
            .max_labels(max_labels)
            .send()
            .await
            .map_err(|e| upstream_error("DetectLabels", e))?;

        let labels: Vec<Label> = output
            .labels
            .unwrap_or_default()
            .into_iter()
            .map(convert_label)
            .collect();
        tracing::debug!("DetectLabels returned {} labels", labels.len());

        Ok(labels)
    }

    #[instrument(skip(self, image), fields(image_bytes = image.len()))]
    async fn detect_custom_labels(
        &self,
        version_arn: &str,
        image: Vec<u8>,
        min_confidence: f32,
    ) -> Result<Vec<CustomLabel>, UpstreamError> {
        let output = self
            .client
            .detect_custom_labels()
            .project_version_arn(version_arn)
            .image(image_from_bytes(image))
            .min_confidence(min_confidence)
            .send()
            .await
            .map_err(|e| upstream_error("DetectCustomLabels", e))?;

        let labels: Vec<CustomLabel> = output
            .custom_labels
            .unwrap_or_default()
            .into_iter()
            .map(convert_custom_label)
            .collect();
        tracing::debug!("DetectCustomLabels returned {} labels", labels.len());

        Ok(labels)
    }
}
