//! Client construction errors.
//!
//! Runtime failures never surface here: they are carried by
//! `HttpResponse::Error`. These errors only come from building a client.

use courier_tls::TlsError;
use thiserror::Error;

/// Result type for client construction.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while building an [`HttpClient`](crate::HttpClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The TLS policy could not be turned into a rustls configuration.
    #[error("TLS configuration error: {0}")]
    Tls(#[from] TlsError),

    /// The base URL is not an absolute URL.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ClientError {
    /// Creates an invalid base URL error.
    pub fn invalid_base_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBaseUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_base_url_display() {
        let err = ClientError::invalid_base_url("api", "relative URL without a base");
        assert_eq!(
            err.to_string(),
            "invalid base URL 'api': relative URL without a base"
        );
    }
}
