//! Error types for the Quick Setup API client.
//!
//! # Design
//! Transport failures and HTTP-level failures are kept apart from
//! `JobFailed`: a background job result can arrive inside a perfectly
//! healthy 200 response and still carry a server-side exception in its
//! `background_job_exception` field. That field always wins over the HTTP
//! status, so it gets its own variant instead of being folded into `Http`.

use std::time::Duration;

use thiserror::Error;

/// A network-level failure reported by a [`Transport`](crate::Transport)
/// implementation: connection refused, DNS failure, timed-out socket.
///
/// Non-2xx responses are *not* transport errors — they come back as
/// [`HttpResponse`](crate::HttpResponse) data and are mapped to
/// [`ApiError::Http`] by the parsers.
#[derive(Debug, Error)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

/// Errors surfaced by the Quick Setup client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a usable response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// A background job finished but reported a server-side exception in
    /// its result payload.
    #[error("background job failed: {0}")]
    JobFailed(String),

    /// The configured poll deadline expired before the job went inactive.
    /// Only reachable when a timeout is set in
    /// [`PollConfig`](crate::PollConfig); the default is an unbounded wait.
    #[error("background job still active after {elapsed:?}")]
    JobTimeout { elapsed: Duration },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}
