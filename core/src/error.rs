//! Error types for the posts API client.
//!
//! # Design
//! Every outcome other than a decoded 2xx body maps to one `ApiError`
//! variant. Failures before the request leaves the process are
//! `Construction`/`Serialization`; failures of the exchange itself are
//! `Transport`, `CrossOrigin` or `Timeout`; a completed exchange can still
//! fail as `Status` or `MalformedResponse`.

use std::time::Duration;

use crate::http::HttpResponse;

/// Errors delivered through a request's completion.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not be built (bad URL, missing POST body, bad header).
    #[error("invalid request: {0}")]
    Construction(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The network layer could not complete the exchange.
    #[error("transport error: {0}")]
    Transport(String),

    /// A cross-origin response arrived without an access grant for `origin`.
    #[error("cross-origin request from {origin} was not granted access")]
    CrossOrigin { origin: String },

    /// The server answered with a status outside `[200, 300)`.
    #[error("Error. Status code: {status}")]
    Status { status: u16, response: HttpResponse },

    /// A 2xx response body was not valid JSON for the expected type.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// No response arrived before the configured deadline.
    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },
}

impl ApiError {
    /// Status code of a `Status` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The raw response kept alongside a `Status` error.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            ApiError::Status { response, .. } => Some(response),
            _ => None,
        }
    }
}
