//! Transport-level error taxonomy shared across clients.

use thiserror::Error;

/// Errors surfaced by HTTP transport operations, before any
/// service-level interpretation of the response.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Building or configuring the HTTP client failed.
    #[error("failed to build HTTP client: {reason}")]
    ClientBuild { reason: String },

    /// The request could not be executed at all.
    #[error("request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    /// The response body did not match the expected shape.
    #[error("invalid response body: {reason}")]
    InvalidBody { reason: String },
}
