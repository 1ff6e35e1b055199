//! JSON-fetching service over a pluggable transport.
//!
//! # Design
//! `ApiService` finalizes a builder, hands the request to a `Transport`,
//! checks the status range and decodes the body. Each step maps to its own
//! `ApiError` variant so callers can branch on where a call failed. There is
//! no retry, caching or timeout layered on top; one call in, one result out.
//!
//! Hosts that execute requests themselves can skip the service and run
//! `parse_response` on the response they got back.

use log::{debug, warn};
use serde::de::DeserializeOwned;

use crate::builder::RequestBuilding;
use crate::decoder::{DecodeWithContext, JsonDecoder};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one finalized request.
///
/// Implementations return non-2xx responses as data; only failures to
/// complete the exchange are errors.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut call = self.agent.get(request.url.as_str());
        for (field, value) in &request.headers {
            call = call.header(field.as_str(), value.as_str());
        }
        let mut response = call.call().map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Fetch an endpoint and decode its JSON body.
pub trait FetchService {
    fn fetch_data<D: DeserializeOwned>(&self, endpoint: &impl RequestBuilding) -> Result<D, ApiError>;
}

#[derive(Debug, Clone, Default)]
pub struct ApiService<T = UreqTransport> {
    transport: T,
    decoder: JsonDecoder,
}

impl ApiService<UreqTransport> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Transport> ApiService<T> {
    pub fn with_transport(transport: T, decoder: JsonDecoder) -> Self {
        Self { transport, decoder }
    }

    pub fn decoder(&self) -> &JsonDecoder {
        &self.decoder
    }

    /// Like `fetch_data`, but decodes through the decoder's persistence
    /// context.
    pub fn fetch_with_context<D: DecodeWithContext>(
        &self,
        endpoint: &impl RequestBuilding,
    ) -> Result<D, ApiError> {
        let response = self.round_trip(endpoint)?;
        self.decoder.decode_with_context(&response.body).inspect_err(|e| {
            warn!("decoding response failed: {e}");
        })
    }

    fn round_trip(&self, endpoint: &impl RequestBuilding) -> Result<HttpResponse, ApiError> {
        let request = endpoint.try_build()?;
        debug!("GET {}", request.url);
        let response = self.transport.execute(&request)?;
        check_status(&response)?;
        Ok(response)
    }
}

impl<T: Transport> FetchService for ApiService<T> {
    fn fetch_data<D: DeserializeOwned>(&self, endpoint: &impl RequestBuilding) -> Result<D, ApiError> {
        let response = self.round_trip(endpoint)?;
        parse_body(&self.decoder, &response)
    }
}

/// Reject any status outside `[200, 300)`.
pub fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    warn!("bad server response: HTTP {}", response.status);
    Err(ApiError::BadServerResponse {
        status: response.status,
        body: response.body.clone(),
    })
}

/// Status check plus decode, for hosts that do their own I/O.
pub fn parse_response<D: DeserializeOwned>(
    decoder: &JsonDecoder,
    response: &HttpResponse,
) -> Result<D, ApiError> {
    check_status(response)?;
    parse_body(decoder, response)
}

fn parse_body<D: DeserializeOwned>(decoder: &JsonDecoder, response: &HttpResponse) -> Result<D, ApiError> {
    decoder.decode(&response.body).map_err(|e| {
        warn!("decoding response failed: {e}");
        ApiError::Decode(e.to_string())
    })
}
