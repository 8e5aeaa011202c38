//! Error types for the REST client
//!
//! Every backend call funnels into [`ApiError`]. Callers that must not
//! propagate (the context-style stores) convert it to a display string.

/// Errors raised while talking to the backend API
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport failure (connection refused, DNS, timeout)
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx HTTP status
    #[error("HTTP {status} from {path}: {body}")]
    Status {
        /// Status code returned by the server
        status: u16,
        /// Request path relative to the API base
        path: String,
        /// Response body, possibly truncated
        body: String,
    },

    /// Response body was not the expected JSON shape
    #[error("invalid response from {path}: {message}")]
    Decode {
        /// Request path relative to the API base
        path: String,
        /// Decoder message
        message: String,
    },

    /// Envelope reported `success: false`
    #[error("backend rejected request: {0}")]
    Rejected(String),

    /// Envelope was successful but carried no `data`
    #[error("response from {0} carried no data")]
    MissingData(String),

    /// Client misconfiguration (bad base URL, header value)
    #[error("client configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Check if retrying the same request could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// HTTP status, if the server answered at all
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;
