//! Transport-level response.

use crate::error::{TransportFailure, TransportFailureKind};
use crate::headers::ResponseHeaders;
use bytes::Bytes;

/// Status reserved for "no HTTP response was received".
pub const TRANSPORT_FAILURE_STATUS: i32 = -1;

/// The raw result of one exchange, as seen by the interceptor chain.
///
/// Either an HTTP response (status, headers, decompressed body) or the
/// sentinel form with status [`TRANSPORT_FAILURE_STATUS`] describing why no
/// response arrived. The body is fully buffered, so logging and decoding can
/// both read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    status: i32,
    message: Option<String>,
    headers: ResponseHeaders,
    body: Bytes,
    failure: Option<TransportFailure>,
}

impl RawResponse {
    /// Creates a response with the given status.
    pub fn new(
        status: i32,
        message: Option<String>,
        headers: ResponseHeaders,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            status,
            message,
            headers,
            body: body.into(),
            failure: None,
        }
    }

    /// Creates the sentinel response for a transport failure.
    #[must_use]
    pub fn transport_failure(failure: TransportFailure) -> Self {
        Self {
            status: TRANSPORT_FAILURE_STATUS,
            message: Some(failure.to_string()),
            headers: ResponseHeaders::default(),
            body: Bytes::new(),
            failure: Some(failure),
        }
    }

    /// Creates a sentinel response carrying only a message.
    ///
    /// Classified as a generic I/O failure when decoded.
    pub fn sentinel(message: impl Into<String>) -> Self {
        Self {
            status: TRANSPORT_FAILURE_STATUS,
            message: Some(message.into()),
            headers: ResponseHeaders::default(),
            body: Bytes::new(),
            failure: None,
        }
    }

    /// Returns the status code, or [`TRANSPORT_FAILURE_STATUS`].
    #[must_use]
    pub fn status(&self) -> i32 {
        self.status
    }

    /// Returns true if this is the transport-failure sentinel.
    #[must_use]
    pub fn is_transport_failure(&self) -> bool {
        self.status == TRANSPORT_FAILURE_STATUS
    }

    /// Returns true for a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// Returns the status message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &ResponseHeaders {
        &self.headers
    }

    /// Returns the (already decompressed) body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decodes the body using the charset from `Content-Type`.
    #[must_use]
    pub fn text(&self) -> String {
        self.headers.decode_text(&self.body)
    }

    /// Returns the structured cause of a sentinel response.
    ///
    /// A sentinel without a recorded cause is reported as an I/O failure
    /// with its message. Returns `None` for real HTTP responses.
    #[must_use]
    pub fn failure(&self) -> Option<TransportFailure> {
        if !self.is_transport_failure() {
            return None;
        }
        Some(self.failure.clone().unwrap_or_else(|| {
            TransportFailure::new(
                TransportFailureKind::Io,
                self.message.clone().unwrap_or_else(|| "Network error".to_string()),
            )
        }))
    }

    /// Returns this response with its body replaced.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns this response with an extra header value appended.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }
}
