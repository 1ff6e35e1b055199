//! Error types for request building, fetching and decoding.
//!
//! # Design
//! `BadServerResponse` and `Decode` are separate variants so callers can
//! tell "the server rejected or failed the call" apart from "the server
//! answered but the body had the wrong shape." A missing decode context is
//! a configuration mistake, not a payload problem, so it gets its own enum.

use thiserror::Error;

/// Errors returned by `ApiService` and `RequestBuilder::try_build`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Scheme, host, path and query could not form a valid URL.
    #[error("malformed URL {url:?}: {reason}")]
    MalformedUrl { url: String, reason: String },

    /// The network call itself failed.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server answered with a status outside `[200, 300)`.
    #[error("bad server response (HTTP {status}): {body}")]
    BadServerResponse { status: u16, body: String },

    /// The response body could not be decoded into the expected type.
    #[error("decoding failed: {0}")]
    Decode(String),

    #[error(transparent)]
    Configuration(#[from] DecodingConfigurationError),
}

/// A decode needed a persistence context the decoder was not given.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodingConfigurationError {
    #[error("decoder has no managed object context")]
    MissingManagedObjectContext,

    #[error("decoder has no model container")]
    MissingModelContainer,
}

/// Failures while decoding a JSON resource shipped with the application.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to locate {0} in bundle")]
    NotFound(String),

    #[error("failed to read {file} from bundle: {source}")]
    Unreadable {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {file} from bundle due to missing key: {message}")]
    KeyNotFound { file: String, message: String },

    #[error("failed to decode {file} from bundle due to type mismatch: {message}")]
    TypeMismatch { file: String, message: String },

    #[error("failed to decode {file} from bundle: {message}")]
    Malformed { file: String, message: String },
}

/// Invalid or missing API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}
