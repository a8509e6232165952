use crate::config::{version_name, RekognitionConfig};
use serde::{Serialize, Serializer};
use std::fmt;

/// The custom model this service drives: one project version inside one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResource {
    project_arn: String,
    version_arn: String,
    version_name: String,
}

impl ModelResource {
    pub fn new(project_arn: &str, version_arn: &str) -> Result<Self, String> {
        let version_name = version_name(version_arn)
            .ok_or_else(|| format!("project version arn has no version segment: {}", version_arn))?
            .to_string();
        Ok(Self {
            project_arn: project_arn.to_string(),
            version_arn: version_arn.to_string(),
            version_name,
        })
    }

    pub fn from_config(config: &RekognitionConfig) -> Result<Self, String> {
        Self::new(&config.project_arn, &config.project_version_arn)
    }

    pub fn project_arn(&self) -> &str {
        &self.project_arn
    }

    pub fn version_arn(&self) -> &str {
        &self.version_arn
    }

    pub fn version_name(&self) -> &str {
        &self.version_name
    }
}

/// Project version status as reported by Rekognition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelStatus {
    TrainingInProgress,
    TrainingCompleted,
    TrainingFailed,
    Starting,
    Running,
    Failed,
    Stopping,
    Stopped,
    Deleting,
    CopyingInProgress,
    CopyingCompleted,
    CopyingFailed,
    Deprecated,
    Expired,
    Unknown(String),
}

impl ModelStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ModelStatus::TrainingInProgress => "TRAINING_IN_PROGRESS",
            ModelStatus::TrainingCompleted => "TRAINING_COMPLETED",
            ModelStatus::TrainingFailed => "TRAINING_FAILED",
            ModelStatus::Starting => "STARTING",
            ModelStatus::Running => "RUNNING",
            ModelStatus::Failed => "FAILED",
            ModelStatus::Stopping => "STOPPING",
            ModelStatus::Stopped => "STOPPED",
            ModelStatus::Deleting => "DELETING",
            ModelStatus::CopyingInProgress => "COPYING_IN_PROGRESS",
            ModelStatus::CopyingCompleted => "COPYING_COMPLETED",
            ModelStatus::CopyingFailed => "COPYING_FAILED",
            ModelStatus::Deprecated => "DEPRECATED",
            ModelStatus::Expired => "EXPIRED",
            ModelStatus::Unknown(other) => other,
        }
    }

    /// Serving, or on its way to serving.
    pub fn is_up(&self) -> bool {
        matches!(self, ModelStatus::Starting | ModelStatus::Running)
    }

    /// Not serving, or on its way to not serving.
    pub fn is_down(&self) -> bool {
        matches!(self, ModelStatus::Stopping | ModelStatus::Stopped)
    }
}

impl From<&str> for ModelStatus {
    fn from(s: &str) -> Self {
        match s {
            "TRAINING_IN_PROGRESS" => ModelStatus::TrainingInProgress,
            "TRAINING_COMPLETED" => ModelStatus::TrainingCompleted,
            "TRAINING_FAILED" => ModelStatus::TrainingFailed,
            "STARTING" => ModelStatus::Starting,
            "RUNNING" => ModelStatus::Running,
            "FAILED" => ModelStatus::Failed,
            "STOPPING" => ModelStatus::Stopping,
            "STOPPED" => ModelStatus::Stopped,
            "DELETING" => ModelStatus::Deleting,
            "COPYING_IN_PROGRESS" => ModelStatus::CopyingInProgress,
            "COPYING_COMPLETED" => ModelStatus::CopyingCompleted,
            "COPYING_FAILED" => ModelStatus::CopyingFailed,
            "DEPRECATED" => ModelStatus::Deprecated,
            "EXPIRED" => ModelStatus::Expired,
            other => ModelStatus::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ModelStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::{PROJECT_ARN, VERSION_ARN};

    #[test]
    fn test_model_resource_version_name() {
        let resource = ModelResource::new(PROJECT_ARN, VERSION_ARN).unwrap();
        assert_eq!(resource.version_name(), "v1");
        assert_eq!(resource.project_arn(), PROJECT_ARN);
        assert!(ModelResource::new(PROJECT_ARN, PROJECT_ARN).is_err());
    }

    #[test]
    fn test_status_strings_are_preserved() {
        for raw in ["STARTING", "RUNNING", "STOPPING", "STOPPED", "FAILED", "EXPIRED"] {
            assert_eq!(ModelStatus::from(raw).as_str(), raw);
        }
        let unknown = ModelStatus::from("SOMETHING_NEW");
        assert_eq!(unknown, ModelStatus::Unknown("SOMETHING_NEW".into()));
        assert_eq!(unknown.to_string(), "SOMETHING_NEW");
    }

    #[test]
    fn test_status_serializes_as_aws_string() {
        let json = serde_json::to_string(&ModelStatus::Running).unwrap();
        assert_eq!(json, "\"RUNNING\"");
    }

    #[test]
    fn test_up_and_down() {
        assert!(ModelStatus::Starting.is_up());
        assert!(ModelStatus::Running.is_up());
        assert!(!ModelStatus::Failed.is_up());
        assert!(ModelStatus::Stopping.is_down());
        assert!(ModelStatus::Stopped.is_down());
        assert!(!ModelStatus::TrainingCompleted.is_down());
    }
}
