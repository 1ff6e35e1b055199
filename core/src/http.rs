//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe a finalized request and its response as plain data.
//! `RequestBuilder::build` produces an `HttpRequest`; a `Transport` (or a
//! native host across the FFI boundary) executes it and hands back an
//! `HttpResponse`. Keeping them as owned data keeps the builder free of I/O
//! and lets the same values cross a C ABI without lifetime concerns.

use std::collections::BTreeMap;

/// A finalized request descriptor: the full URL plus the header mapping.
///
/// Method-agnostic. Transports issue it as a `GET`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

impl HttpRequest {
    pub fn header(&self, field: &str) -> Option<&str> {
        self.headers.get(field).map(String::as_str)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Whether the status falls in the `[200, 300)` success range.
    pub fn is_success(&self) -> bool {
        is_success_status(self.status)
    }
}

pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}
