//! Where an API lives: scheme, host and an optional common base path.
//!
//! Loaded from the environment or deserialized from a bundled JSON file,
//! then turned into per-endpoint builders.

use std::env;

use serde::Deserialize;

use crate::builder::{RequestBuilder, DEFAULT_SCHEME};
use crate::error::ConfigError;

pub const SCHEME_VAR: &str = "IB_API_SCHEME";
pub const HOST_VAR: &str = "IB_API_HOST";
pub const BASE_PATH_VAR: &str = "IB_API_BASE_PATH";
pub const PORT_VAR: &str = "IB_API_PORT";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    #[serde(default = "default_scheme")]
    pub scheme: String,
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub base_path: String,
}

fn default_scheme() -> String {
    DEFAULT_SCHEME.to_string()
}

impl ApiConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            scheme: default_scheme(),
            host: host.into(),
            port: None,
            base_path: String::new(),
        }
    }

    /// Read `IB_API_HOST` (required) plus the optional scheme, port and base
    /// path variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup(HOST_VAR)
            .filter(|h| !h.is_empty())
            .ok_or(ConfigError::MissingVar(HOST_VAR))?;
        let port = match lookup(PORT_VAR) {
            Some(raw) => Some(raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: PORT_VAR,
                value: raw,
            })?),
            None => None,
        };
        Ok(Self {
            scheme: lookup(SCHEME_VAR).unwrap_or_else(default_scheme),
            host,
            port,
            base_path: lookup(BASE_PATH_VAR).unwrap_or_default(),
        })
    }

    /// A builder for `path` under this API's base path.
    pub fn endpoint(&self, path: &str) -> RequestBuilder {
        let builder =
            RequestBuilder::with_base_path(self.scheme.as_str(), self.host.as_str(), &self.base_path, path);
        match self.port {
            Some(port) => builder.with_port(port),
            None => builder,
        }
    }
}
