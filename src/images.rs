use crate::config::StorageConfig;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Invalid image reference: {0}")]
    InvalidReference(String),
    #[error("Image file not found: {0}")]
    NotFound(String),
    #[error("Failed to read image {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Read-only view over the directory the upload component writes captures to.
#[derive(Debug, Clone)]
pub struct ImageStore {
    public_dir: PathBuf,
    images_dir: PathBuf,
}

impl ImageStore {
    pub fn new(public_dir: impl Into<PathBuf>, images_dir: impl Into<PathBuf>) -> Self {
        Self {
            public_dir: public_dir.into(),
            images_dir: images_dir.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.public_dir.clone(), config.get_images_dir())
    }

    /// Maps a public path such as `/images/image_1.png` under the public directory.
    pub fn resolve_path(&self, image_path: &str) -> Result<PathBuf, ImageError> {
        let relative = Path::new(image_path.trim_start_matches('/'));
        let mut resolved = self.public_dir.clone();
        let mut pushed = false;

        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    pushed = true;
                }
                Component::CurDir => {}
                _ => return Err(ImageError::InvalidReference(image_path.to_string())),
            }
        }

        if !pushed {
            return Err(ImageError::InvalidReference(image_path.to_string()));
        }
        Ok(resolved)
    }

    /// Maps any reference carrying a file name (path, URL) into the images directory.
    pub fn resolve_reference(&self, reference: &str) -> Result<(String, PathBuf), ImageError> {
        let name = file_name(reference)
            .ok_or_else(|| ImageError::InvalidReference(reference.to_string()))?;
        Ok((name.to_string(), self.images_dir.join(name)))
    }

    pub async fn read(&self, path: &Path) -> Result<Vec<u8>, ImageError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ImageError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(ImageError::ReadFailed {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }
}

fn file_name(reference: &str) -> Option<&str> {
    if let Some(data_url) = reference.strip_prefix("data:") {
        return data_url_name(data_url);
    }

    let without_fragment = reference.split('#').next().unwrap_or_default();
    let without_query = without_fragment.split('?').next().unwrap_or_default();
    let name = without_query
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    match name {
        "" | "." | ".." => None,
        name if name.contains(':') => None,
        name => Some(name),
    }
}

// data:image/png;name=capture.png;base64,...
fn data_url_name(data_url: &str) -> Option<&str> {
    let header = data_url.split(',').next().unwrap_or_default();
    header
        .split(';')
        .filter_map(|param| {
            param
                .strip_prefix("name=")
                .or_else(|| param.strip_prefix("filename="))
        })
        .next()
        .and_then(file_name)
}
