use axum::http::HeaderValue;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    pub rekognition: RekognitionConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

impl Config {
    pub fn validate(&self) -> Result<(), String> {
        self.rekognition.validate()?;
        self.cors.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Settings for the Rekognition client and the single custom model it drives.
#[derive(Debug, Deserialize, Clone)]
pub struct RekognitionConfig {
    pub region: String,
    pub project_arn: String,
    pub project_version_arn: String,
    /// Named AWS profile, falls back to the default credential chain when unset.
    #[serde(default)]
    pub profile: Option<String>,
    /// Endpoint override, e.g. a local emulator.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default = "default_min_inference_units")]
    pub min_inference_units: i32,
    #[serde(default = "default_max_labels")]
    pub max_labels: i32,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_min_inference_units() -> i32 {
    1
}

fn default_max_labels() -> i32 {
    5
}

fn default_min_confidence() -> f32 {
    70.0
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    3
}

impl RekognitionConfig {
    pub fn get_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        let project = project_name(&self.project_arn, "project_arn")?;
        let version_project = project_name(&self.project_version_arn, "project_version_arn")?;
        if project != version_project {
            return Err(format!(
                "project_version_arn belongs to project `{}`, expected `{}`",
                version_project, project
            ));
        }
        if version_name(&self.project_version_arn).is_none() {
            return Err(format!(
                "project_version_arn has no version segment: {}",
                self.project_version_arn
            ));
        }
        if self.min_inference_units < 1 {
            return Err("min_inference_units must be at least 1".into());
        }
        if self.max_labels < 1 {
            return Err("max_labels must be at least 1".into());
        }
        if !(0.0..=100.0).contains(&self.min_confidence) {
            return Err(format!(
                "min_confidence must be within 0..=100, got {}",
                self.min_confidence
            ));
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".into());
        }
        Ok(())
    }
}

fn project_name<'a>(arn: &'a str, field: &str) -> Result<&'a str, String> {
    if arn.trim().is_empty() {
        return Err(format!("{} must be set", field));
    }
    if !arn.starts_with("arn:") {
        return Err(format!("{} is not an ARN: {}", field, arn));
    }
    arn.split_once(":project/")
        .and_then(|(_, rest)| rest.split('/').next())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| format!("{} has no project segment: {}", field, arn))
}

/// Extracts `v1` from `arn:aws:rekognition:<region>:<account>:project/<name>/version/v1/<ts>`.
pub fn version_name(version_arn: &str) -> Option<&str> {
    version_arn
        .split_once("/version/")
        .and_then(|(_, rest)| rest.split('/').next())
        .filter(|name| !name.is_empty())
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub public_dir: PathBuf,
    #[serde(default = "default_images_subdir")]
    pub images_subdir: String,
}

fn default_images_subdir() -> String {
    "images".into()
}

impl StorageConfig {
    pub fn get_images_dir(&self) -> PathBuf {
        self.public_dir.join(&self.images_subdir)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

fn default_allowed_origin() -> String {
    "http://localhost:3000".into()
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: default_allowed_origin(),
        }
    }
}

impl CorsConfig {
    /// Accepts exactly one `http(s)://host[:port]` origin. A wildcard cannot be
    /// combined with credentialed requests.
    pub fn validate(&self) -> Result<(), String> {
        let url = Url::parse(&self.allowed_origin)
            .map_err(|e| format!("invalid cors origin `{}`: {}", self.allowed_origin, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "cors origin `{}` must use http or https",
                self.allowed_origin
            ));
        }
        if url.origin().ascii_serialization() != self.allowed_origin {
            return Err(format!(
                "cors origin `{}` must be of the form scheme://host[:port]",
                self.allowed_origin
            ));
        }
        self.get_origin().map(|_| ())
    }

    pub fn get_origin(&self) -> Result<HeaderValue, String> {
        self.allowed_origin
            .parse::<HeaderValue>()
            .map_err(|e| format!("invalid cors origin `{}`: {}", self.allowed_origin, e))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub enum LogLevel {
    Debug,
    Info,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "{} is not a supported minimum log level. Use either `debug` or `info`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("no working directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let config = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(
            config::File::from(
                configuration_directory.join(format!("{}.yaml", environment.as_str())),
            )
            .required(false),
        )
        .add_source(
            config::Environment::with_prefix("RP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let config: Config = config.try_deserialize::<Config>()?;

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        return Err(config::ConfigError::Message(e));
    }

    Ok(config)
}
