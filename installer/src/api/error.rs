//! Errors arising from release API requests.

use crate::version::ReleaseChannel;

/// Errors arising from release API requests.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The HTTP request failed or returned a non-success status.
    #[error("request to {url} failed: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The endpoint answered 404.
    #[error("not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The response body did not match the expected schema.
    #[error("invalid response from {url}: {reason}")]
    InvalidResponse {
        /// The URL that was requested.
        url: String,
        /// Which check failed.
        reason: String,
    },

    /// The API does not serve this channel.
    #[error("the release API does not serve the {channel} channel")]
    UnsupportedChannel {
        /// The rejected channel.
        channel: ReleaseChannel,
    },
}

impl FetchError {
    /// Return true when the failure is a malformed or mismatched response
    /// rather than a transport problem.
    #[must_use]
    pub fn is_invalid_response(&self) -> bool {
        matches!(self, Self::InvalidResponse { .. })
    }
}
