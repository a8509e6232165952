use crate::images::{ImageError, ImageStore};
use crate::label::{CustomLabel, Label};
use crate::model::ModelResource;
use crate::rekognition::{RekognitionService, UpstreamError};
use crate::telemetry::Metrics;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum ForwardError {
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("No images were processed ({missing} missing, {failed} failed)")]
    NoResults { missing: usize, failed: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageLabels {
    pub image: String,
    pub labels: Vec<CustomLabel>,
}

/// Limits applied to every detection request.
#[derive(Debug, Clone)]
pub struct DetectionSettings {
    pub max_labels: i32,
    pub min_confidence: f32,
}

/// Reads captured images from disk and hands their bytes to Rekognition.
pub struct InferenceForwarder<R: RekognitionService> {
    rekognition: Arc<R>,
    store: ImageStore,
    resource: ModelResource,
    settings: DetectionSettings,
    metrics: Arc<Metrics>,
}

impl<R: RekognitionService> InferenceForwarder<R> {
    pub fn new(
        rekognition: Arc<R>,
        store: ImageStore,
        resource: ModelResource,
        settings: DetectionSettings,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            rekognition,
            store,
            resource,
            settings,
            metrics,
        }
    }

    /// General label detection for one image. A missing file fails before any
    /// network call is made.
    #[instrument(skip(self))]
    pub async fn detect_labels(&self, image_path: &str) -> Result<Vec<Label>, ForwardError> {
        let path = self.store.resolve_path(image_path)?;
        let bytes = self.store.read(&path).await.inspect_err(|e| {
            tracing::warn!("Cannot read {}: {}", image_path, e);
        })?;

        let labels = self
            .metrics
            .observe_upstream(
                "detect_labels",
                self.rekognition.detect_labels(bytes, self.settings.max_labels),
            )
            .await?;
        tracing::info!("Detected {} labels for {}", labels.len(), image_path);

        Ok(labels)
    }

    /// Custom label detection over a batch. Every per-image failure, whether
    /// the file is unreadable or the detection call fails, is logged and
    /// skipped; only a batch with nothing processed is an error.
    #[instrument(skip(self, references), fields(batch_size = references.len()))]
    pub async fn detect_custom_labels(
        &self,
        references: &[String],
    ) -> Result<Vec<ImageLabels>, ForwardError> {
        let mut results = Vec::with_capacity(references.len());
        let mut missing = 0;
        let mut failed = 0;

        for reference in references {
            match self.detect_one(reference).await {
                Ok(entry) => results.push(entry),
                Err(ForwardError::Image(e)) => {
                    tracing::warn!("Skipping image {}: {}", reference, e);
                    missing += 1;
                }
                Err(e) => {
                    tracing::warn!("Skipping image {} after detection failure: {}", reference, e);
                    failed += 1;
                }
            }
        }

        self.metrics.record_skipped_images((missing + failed) as u64);

        if results.is_empty() {
            tracing::error!(
                "No images processed out of {} ({} missing, {} failed)",
                references.len(),
                missing,
                failed
            );
            return Err(ForwardError::NoResults { missing, failed });
        }

        tracing::info!(
            "Processed {} of {} images",
            results.len(),
            references.len()
        );
        Ok(results)
    }

    async fn detect_one(&self, reference: &str) -> Result<ImageLabels, ForwardError> {
        let (image, path) = self.store.resolve_reference(reference)?;
        let bytes = self.store.read(&path).await?;

        let labels = self
            .metrics
            .observe_upstream(
                "detect_custom_labels",
                self.rekognition.detect_custom_labels(
                    self.resource.version_arn(),
                    bytes,
                    self.settings.min_confidence,
                ),
            )
            .await?;

        Ok(ImageLabels { image, labels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::{PROJECT_ARN, VERSION_ARN};
    use crate::model::ModelStatus;
    use crate::rekognition::mock::MockRekognition;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        mock: MockRekognition,
        forwarder: InferenceForwarder<MockRekognition>,
    }

    fn fixture(images: &[(&str, &str)]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let images_dir = dir.path().join("images");
        std::fs::create_dir_all(&images_dir).unwrap();
        for (name, bytes) in images {
            std::fs::write(images_dir.join(name), bytes.as_bytes()).unwrap();
        }

        let mock = MockRekognition::with_status(ModelStatus::Running);
        let forwarder = InferenceForwarder::new(
            Arc::new(mock.clone()),
            ImageStore::new(dir.path(), images_dir),
            ModelResource::new(PROJECT_ARN, VERSION_ARN).unwrap(),
            DetectionSettings {
                max_labels: 5,
                min_confidence: 70.0,
            },
            Arc::new(Metrics::new().unwrap()),
        );

        Fixture {
            _dir: dir,
            mock,
            forwarder,
        }
    }

    fn refs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_detect_labels() {
        let f = fixture(&[("a.jpg", "cat")]);
        let labels = f.forwarder.detect_labels("/images/a.jpg").await.unwrap();
        assert_eq!(labels, vec![Label::new("cat", 99.0)]);
    }

    #[tokio::test]
    async fn test_detect_labels_missing_file_skips_network() {
        let f = fixture(&[]);
        let result = f.forwarder.detect_labels("/images/missing.jpg").await;
        assert!(matches!(
            result,
            Err(ForwardError::Image(ImageError::NotFound(_)))
        ));
        assert_eq!(f.mock.detect_calls(), 0);
    }

    #[tokio::test]
    async fn test_batch_with_one_of_three_present() {
        let f = fixture(&[("b.jpg", "dog")]);
        let results = f
            .forwarder
            .detect_custom_labels(&refs(&["/images/a.jpg", "/images/b.jpg", "/images/c.jpg"]))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].image, "b.jpg");
        assert_eq!(results[0].labels[0].name, "dog");
        assert_eq!(f.mock.detect_calls(), 1);
    }

    #[tokio::test]
    async fn test_batch_with_nothing_present() {
        let f = fixture(&[]);
        let result = f
            .forwarder
            .detect_custom_labels(&refs(&["/images/a.jpg", "/images/b.jpg"]))
            .await;

        assert!(matches!(
            result,
            Err(ForwardError::NoResults {
                missing: 2,
                failed: 0
            })
        ));
        assert_eq!(f.mock.detect_calls(), 0);
        assert_eq!(crate::telemetry::upstream_families(&f.forwarder.metrics), 0);
    }

    #[tokio::test]
    async fn test_detect_labels_upstream_failure() {
        let f = fixture(&[("a.jpg", "corrupt")]);
        f.mock.fail_image(b"corrupt");

        match f.forwarder.detect_labels("/images/a.jpg").await {
            Err(ForwardError::Upstream(err)) => {
                assert_eq!(err.operation, "DetectLabels");
                assert_eq!(err.message, "Request has invalid image format");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(crate::telemetry::upstream_families(&f.forwarder.metrics) >= 2);
    }

    #[tokio::test]
    async fn test_batch_skips_detection_failures() {
        let f = fixture(&[("a.jpg", "cat"), ("bad.jpg", "corrupt")]);
        f.mock.fail_image(b"corrupt");

        let results = f
            .forwarder
            .detect_custom_labels(&refs(&["/images/bad.jpg", "/images/a.jpg"]))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].image, "a.jpg");

        let result = f
            .forwarder
            .detect_custom_labels(&refs(&["/images/bad.jpg"]))
            .await;
        assert!(matches!(
            result,
            Err(ForwardError::NoResults {
                missing: 0,
                failed: 1
            })
        ));
    }

    #[tokio::test]
    async fn test_batch_keeps_request_order() {
        let f = fixture(&[("a.jpg", "cat"), ("b.jpg", "dog")]);
        let results = f
            .forwarder
            .detect_custom_labels(&refs(&["/images/b.jpg", "/images/a.jpg"]))
            .await
            .unwrap();
        let names: Vec<&str> = results.iter().map(|r| r.image.as_str()).collect();
        assert_eq!(names, vec!["b.jpg", "a.jpg"]);
    }
}
