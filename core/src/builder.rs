//! Immutable URL/request builder.
//!
//! # Design
//! `RequestBuilder` is a value type. Every mutator borrows `self` and returns
//! a fresh builder, so a base builder for a service can be shared and
//! branched into endpoint-specific variants without any aliasing. The
//! normalized path is computed once in the constructor; query items and
//! headers accumulate on top of it. Nothing is validated until `build`,
//! which is the only place a URL is actually assembled.

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use url::{form_urlencoded, Position, Url};

use crate::error::ApiError;
use crate::http::HttpRequest;

/// Capability set shared by request builders.
///
/// The optional operations default to returning an unchanged copy, so an
/// implementor only has to say how it finalizes.
pub trait RequestBuilding: Clone {
    /// Finalize into a request descriptor, or `None` if no valid URL can be
    /// formed. Side-effect free.
    fn build(&self) -> Option<HttpRequest>;

    /// Like `build`, but says why finalizing failed.
    fn try_build(&self) -> Result<HttpRequest, ApiError> {
        self.build().ok_or_else(|| ApiError::MalformedUrl {
            url: String::new(),
            reason: "builder produced no request".to_string(),
        })
    }

    /// Common prefix joined in front of every endpoint path.
    fn base_path(&self) -> &str {
        ""
    }

    fn add_query_item(&self, _name: &str, _value: Option<&str>) -> Option<Self> {
        Some(self.clone())
    }

    fn add_header(&self, _field: &str, _value: &str) -> Self {
        self.clone()
    }
}

/// A single query parameter. A `None` value is a flag (`?name`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryItem {
    pub name: String,
    pub value: Option<String>,
}

pub const DEFAULT_SCHEME: &str = "https";

/// Bytes escaped inside one path segment. `%` and `\` are included so the
/// path reaches the server exactly as written.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBuilder {
    scheme: String,
    host: String,
    port: Option<u16>,
    base_path: String,
    path: String,
    query_items: Vec<QueryItem>,
    headers: BTreeMap<String, String>,
}

impl RequestBuilder {
    /// An `https` builder with no base path.
    pub fn new(host: impl Into<String>, path: &str) -> Self {
        Self::with_base_path(DEFAULT_SCHEME, host, "", path)
    }

    pub fn with_scheme(scheme: impl Into<String>, host: impl Into<String>, path: &str) -> Self {
        Self::with_base_path(scheme, host, "", path)
    }

    pub fn with_base_path(
        scheme: impl Into<String>,
        host: impl Into<String>,
        base_path: &str,
        path: &str,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port: None,
            base_path: base_path.to_string(),
            path: normalize_path(base_path, path),
            query_items: Vec::new(),
            headers: BTreeMap::new(),
        }
    }

    /// Returns a copy that targets an explicit port.
    pub fn with_port(&self, port: u16) -> Self {
        let mut next = self.clone();
        next.port = Some(port);
        next
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The normalized path, fixed at construction.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_items(&self) -> &[QueryItem] {
        &self.query_items
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    fn origin(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{port}", self.scheme, self.host),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }

    fn assemble(&self) -> Result<String, ApiError> {
        let origin = self.origin();
        let malformed = |reason: String| ApiError::MalformedUrl {
            url: origin.clone(),
            reason,
        };

        let url = Url::parse(&origin).map_err(|e| malformed(e.to_string()))?;

        // Reserved characters in the host would otherwise be read as userinfo,
        // path, query or fragment.
        let host_only = url.username().is_empty()
            && url.password().is_none()
            && matches!(url.path(), "" | "/")
            && url.query().is_none()
            && url.fragment().is_none();
        if !host_only || url.cannot_be_a_base() {
            return Err(malformed("host is not a plain authority".to_string()));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(malformed("host is empty".to_string()));
        }

        // The path is appended as text so the parser cannot resolve dot
        // segments or reinterpret `\` and `%`.
        let mut assembled = url[..Position::BeforePath].to_string();
        assembled.push_str(&encode_path(&self.path));

        if !self.query_items.is_empty() {
            let mut query = form_urlencoded::Serializer::new(String::new());
            for item in &self.query_items {
                match &item.value {
                    Some(value) => query.append_pair(&item.name, value),
                    None => query.append_key_only(&item.name),
                };
            }
            assembled.push('?');
            assembled.push_str(&query.finish());
        }

        Ok(assembled)
    }
}

impl RequestBuilding for RequestBuilder {
    fn build(&self) -> Option<HttpRequest> {
        self.try_build().ok()
    }

    fn try_build(&self) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            url: self.assemble()?,
            headers: self.headers.clone(),
        })
    }

    fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Query text is form-encoded when finalized: a space becomes `+`, not
    /// `%20`.
    fn add_query_item(&self, name: &str, value: Option<&str>) -> Option<Self> {
        let mut next = self.clone();
        next.query_items.push(QueryItem {
            name: name.to_string(),
            value: value.map(str::to_string),
        });
        Some(next)
    }

    fn add_header(&self, field: &str, value: &str) -> Self {
        let mut next = self.clone();
        next.headers.insert(field.to_string(), value.to_string());
        next
    }
}

/// Join `base_path` and `path` with exactly one slash between them and a
/// leading slash in front.
///
/// - `("", "")` -> `/`
/// - `("", "users")` -> `/users`
/// - `("/v1/", "/users")` -> `/v1/users`
pub fn normalize_path(base_path: &str, path: &str) -> String {
    let base = base_path.trim_matches('/');
    let path = path.trim_matches('/');
    match (base.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{path}"),
        (false, true) => format!("/{base}"),
        (false, false) => format!("/{base}/{path}"),
    }
}

/// Percent-encode each segment of a normalized path. `.` and `..` are
/// escaped as well, so they name a segment instead of moving up the tree.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment {
            "." => "%2E".to_string(),
            ".." => "%2E%2E".to_string(),
            _ => utf8_percent_encode(segment, SEGMENT).to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}
