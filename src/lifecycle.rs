use crate::model::{ModelResource, ModelStatus};
use crate::rekognition::{RekognitionService, UpstreamError};
use crate::telemetry::Metrics;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Model is already {status}")]
    Conflict { status: ModelStatus },
    #[error("No version `{version}` found for project {project}")]
    ModelNotFound { project: String, version: String },
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Start, stop and status of the one configured model version.
///
/// Every call asks Rekognition for the current state; nothing is remembered
/// between requests. Transitions run asynchronously on the AWS side, so callers
/// poll [`ModelLifecycleProxy::status`] to follow them.
pub struct ModelLifecycleProxy<R: RekognitionService> {
    rekognition: Arc<R>,
    resource: ModelResource,
    min_inference_units: i32,
    metrics: Arc<Metrics>,
}

impl<R: RekognitionService> ModelLifecycleProxy<R> {
    pub fn new(
        rekognition: Arc<R>,
        resource: ModelResource,
        min_inference_units: i32,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            rekognition,
            resource,
            min_inference_units,
            metrics,
        }
    }

    /// Requests the STOPPED → STARTING transition. Refused when the model is
    /// already starting or running, so no second billable start is issued.
    #[instrument(skip(self), fields(version = self.resource.version_name()))]
    pub async fn start(&self) -> Result<ModelStatus, LifecycleError> {
        let current = self.status().await?;
        if current.is_up() {
            tracing::warn!("Refusing to start model, current status is {}", current);
            return Err(LifecycleError::Conflict { status: current });
        }

        let status = self
            .metrics
            .observe_upstream(
                "start_project_version",
                self.rekognition
                    .start_project_version(self.resource.version_arn(), self.min_inference_units),
            )
            .await?;
        tracing::info!("Model start requested, status {}", status);

        Ok(status)
    }

    /// Requests the RUNNING → STOPPING transition. Refused when the model is
    /// already stopping or stopped.
    #[instrument(skip(self), fields(version = self.resource.version_name()))]
    pub async fn stop(&self) -> Result<ModelStatus, LifecycleError> {
        let current = self.status().await?;
        if current.is_down() {
            tracing::warn!("Refusing to stop model, current status is {}", current);
            return Err(LifecycleError::Conflict { status: current });
        }

        let status = self
            .metrics
            .observe_upstream(
                "stop_project_version",
                self.rekognition.stop_project_version(self.resource.version_arn()),
            )
            .await?;
        tracing::info!("Model stop requested, status {}", status);

        Ok(status)
    }

    #[instrument(skip(self), fields(version = self.resource.version_name()))]
    pub async fn status(&self) -> Result<ModelStatus, LifecycleError> {
        let statuses = self
            .metrics
            .observe_upstream(
                "describe_project_versions",
                self.rekognition.describe_project_versions(
                    self.resource.project_arn(),
                    self.resource.version_name(),
                ),
            )
            .await?;

        statuses
            .into_iter()
            .next()
            .ok_or_else(|| LifecycleError::ModelNotFound {
                project: self.resource.project_arn().to_string(),
                version: self.resource.version_name().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::{PROJECT_ARN, VERSION_ARN};
    use crate::rekognition::mock::MockRekognition;
    use crate::rekognition::UpstreamErrorKind;

    fn proxy(mock: &MockRekognition) -> ModelLifecycleProxy<MockRekognition> {
        let resource = ModelResource::new(PROJECT_ARN, VERSION_ARN).unwrap();
        let metrics = Arc::new(Metrics::new().unwrap());
        ModelLifecycleProxy::new(Arc::new(mock.clone()), resource, 1, metrics)
    }

    #[tokio::test]
    async fn test_start_then_status_is_up() {
        let mock = MockRekognition::with_status(ModelStatus::Stopped);
        let proxy = proxy(&mock);

        assert_eq!(proxy.start().await.unwrap(), ModelStatus::Starting);
        assert!(proxy.status().await.unwrap().is_up());
        assert!(proxy.status().await.unwrap().is_up());
        assert_eq!(mock.start_calls(), 1);
    }

    #[tokio::test]
    async fn test_stop_then_status_is_down() {
        let mock = MockRekognition::with_status(ModelStatus::Running);
        let proxy = proxy(&mock);

        assert_eq!(proxy.stop().await.unwrap(), ModelStatus::Stopping);
        assert!(proxy.status().await.unwrap().is_down());
        assert!(proxy.status().await.unwrap().is_down());
        assert_eq!(mock.stop_calls(), 1);
    }

    #[tokio::test]
    async fn test_double_start_is_refused() {
        let mock = MockRekognition::with_status(ModelStatus::Running);
        let proxy = proxy(&mock);

        let err = proxy.start().await.unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Conflict {
                status: ModelStatus::Running
            }
        ));
        assert_eq!(mock.start_calls(), 0);
    }

    #[tokio::test]
    async fn test_stop_while_stopping_is_refused() {
        let mock = MockRekognition::with_status(ModelStatus::Stopping);
        let proxy = proxy(&mock);

        assert!(matches!(
            proxy.stop().await,
            Err(LifecycleError::Conflict { .. })
        ));
        assert_eq!(mock.stop_calls(), 0);
    }

    #[tokio::test]
    async fn test_status_without_versions() {
        let mock = MockRekognition::without_versions();
        let proxy = proxy(&mock);

        match proxy.status().await {
            Err(LifecycleError::ModelNotFound { version, .. }) => assert_eq!(version, "v1"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upstream_failure_is_surfaced() {
        let mock = MockRekognition::with_status(ModelStatus::Stopped);
        mock.fail_control_plane(UpstreamError::new(
            "DescribeProjectVersions",
            UpstreamErrorKind::AccessDenied,
            "User is not authorized",
        ));
        let proxy = proxy(&mock);

        match proxy.start().await {
            Err(LifecycleError::Upstream(err)) => {
                assert_eq!(err.kind, UpstreamErrorKind::AccessDenied);
                assert_eq!(err.message, "User is not authorized");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_start_is_surfaced_verbatim() {
        let mock = MockRekognition::with_status(ModelStatus::Failed);
        mock.fail_transition(UpstreamError::new(
            "StartProjectVersion",
            UpstreamErrorKind::InvalidRequest,
            "ProjectVersion is in FAILED state and cannot be started",
        ));
        let proxy = proxy(&mock);

        match proxy.start().await {
            Err(LifecycleError::Upstream(err)) => {
                assert_eq!(err.operation, "StartProjectVersion");
                assert_eq!(
                    err.message,
                    "ProjectVersion is in FAILED state and cannot be started"
                );
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(mock.start_calls(), 1);
        assert_eq!(proxy.status().await.unwrap(), ModelStatus::Failed);
    }

    #[tokio::test]
    async fn test_refused_start_records_only_the_describe_call() {
        let mock = MockRekognition::with_status(ModelStatus::Running);
        let proxy = proxy(&mock);

        assert!(proxy.start().await.is_err());
        let families = proxy.metrics.registry.gather();
        let failures = families
            .iter()
            .any(|family| family.get_name().starts_with("upstream_failures"));
        assert!(!failures);
        assert_eq!(crate::telemetry::upstream_families(&proxy.metrics), 1);
    }
}
