//! Remote API error types.

use thiserror::Error;

/// Errors from talking to the remote API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response not read
    /// (server unreachable, timeout, TLS failure).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered 401.
    #[error("unauthorized{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Unauthorized {
        /// The server's `message`, if it sent one.
        message: Option<String>,
    },

    /// The server answered with another non-success status.
    #[error("HTTP {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status {
        /// HTTP status code.
        status: u16,
        /// The server's `message`, if it sent one.
        message: Option<String>,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The configured base URL cannot address `path`.
    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The caller cancelled the request before it completed.
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    /// The message the server put in its error body, verbatim.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message } | Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// HTTP status of a rejected request.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
