//! Error types for transports, the wire codec and the pod-status fetcher.
//!
//! None of these ever reach the viewer directly: connection problems become
//! [`ConnectionPhase`](crate::connection::ConnectionPhase) transitions and
//! fetch failures are logged and swallowed by the render pass.

use thiserror::Error;

/// Errors raised by a live channel when sending outbound events.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The transport task has stopped and can no longer carry requests.
    #[error("Channel closed")]
    Closed,

    /// The outbound queue is full; the request was dropped.
    #[error("Outbound queue full")]
    Backlogged,
}

/// Errors decoding a frame received from the live channel.
#[derive(Debug, Error)]
pub enum WireError {
    /// The frame body was not valid JSON.
    #[error("Malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    /// The frame was JSON but neither an envelope nor an event array.
    #[error("Unrecognised frame shape")]
    Shape,
}

/// Errors that can occur when fetching problematic pods.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse the response body.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Could not reach the endpoint.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}
