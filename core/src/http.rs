//! HTTP boundary types and the transport seam.
//!
//! # Design
//! Requests and responses are plain data. The core builds `HttpRequest`
//! values and parses `HttpResponse` values; the actual round-trip goes
//! through the [`Transport`] trait, so the library never links an HTTP
//! stack of its own. Tests drive the client with a scripted in-memory
//! transport; real callers plug in whatever client they already use.
//!
//! A `Transport` must hand back non-2xx responses as data rather than as
//! errors — status interpretation belongs to the parsers.

use async_trait::async_trait;

use crate::error::TransportError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Executes HTTP round-trips on behalf of the client.
///
/// Implementations return `Err` only for failures that produced no
/// response at all (connection refused, DNS, socket timeout). A served
/// 4xx/5xx is a successful round-trip and must come back as an
/// `HttpResponse`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
