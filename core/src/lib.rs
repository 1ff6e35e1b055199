//! Request building and JSON fetching for API-backed applications.
//!
//! # Overview
//! `RequestBuilder` assembles scheme, host, path, query items and headers
//! into an `HttpRequest` without touching the network. `ApiService` sends
//! that request through a `Transport`, checks the status and decodes the
//! body with a `JsonDecoder`.
//!
//! # Design
//! - Builders are values: every mutator returns a new builder, so a base
//!   builder can be shared and branched freely.
//! - Finalizing is the only fallible step of building; it returns `None`
//!   (or `ApiError::MalformedUrl` from `try_build`) instead of panicking.
//! - Decoding takes its persistence context as an explicit `DecodeContext`.
//! - Types use owned `String` / map fields so they can cross the FFI layer.

pub mod builder;
pub mod bundle;
pub mod config;
pub mod decoder;
pub mod error;
pub mod http;
pub mod service;

pub use builder::{normalize_path, QueryItem, RequestBuilder, RequestBuilding};
pub use bundle::Bundle;
pub use config::ApiConfig;
pub use decoder::{DecodeContext, DecodeWithContext, JsonDecoder, KeyStrategy};
pub use error::{ApiError, ConfigError, DecodingConfigurationError, ResourceError};
pub use http::{HttpRequest, HttpResponse};
pub use service::{ApiService, FetchService, Transport, UreqTransport};
