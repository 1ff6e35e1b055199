//! Decode JSON resources shipped alongside the application.
//!
//! A missing or malformed resource is a recoverable `ResourceError` that the
//! caller can surface during start-up.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::decoder::JsonDecoder;
use crate::error::ResourceError;

/// A directory of bundled resources.
#[derive(Debug, Clone)]
pub struct Bundle {
    root: PathBuf,
}

impl Bundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of `file` inside the bundle, if it exists.
    pub fn url_for_resource(&self, file: &str) -> Option<PathBuf> {
        let path = self.root.join(file);
        path.is_file().then_some(path)
    }

    pub fn decode<D: DeserializeOwned>(&self, file: &str, decoder: &JsonDecoder) -> Result<D, ResourceError> {
        let path = self.root.join(file);
        let data = fs::read_to_string(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ResourceError::NotFound(file.to_string()),
            _ => ResourceError::Unreadable {
                file: file.to_string(),
                source,
            },
        })?;

        decoder.decode(&data).map_err(|e| classify(file, e))
    }
}

fn classify(file: &str, err: serde_json::Error) -> ResourceError {
    let file = file.to_string();
    let message = err.to_string();
    if message.starts_with("missing field") {
        ResourceError::KeyNotFound { file, message }
    } else if message.starts_with("invalid type") {
        ResourceError::TypeMismatch { file, message }
    } else {
        ResourceError::Malformed { file, message }
    }
}
