//! Scripted responses for [`MockServer`](crate::MockServer).

use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use http::header::{HeaderName, HeaderValue};
use http::{Response, StatusCode};
use http_body_util::Full;
use std::io::Write;
use std::time::Duration;

/// A canned response served for a path.
///
/// # Example
///
/// ```
/// use courier_test::MockResponse;
/// use std::time::Duration;
///
/// let response = MockResponse::json(200, r#"{"ok":true}"#)
///     .header("X-Request-Id", "abc")
///     .gzip()
///     .delay(Duration::from_millis(50));
///
/// assert_eq!(response.status(), 200);
/// assert_eq!(response.header_value("content-encoding"), Some("gzip"));
/// ```
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
    delay: Option<Duration>,
}

impl MockResponse {
    /// Creates an empty response with the given status.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
            delay: None,
        }
    }

    /// A JSON response.
    pub fn json(status: u16, body: impl Into<Bytes>) -> Self {
        Self::new(status)
            .header("Content-Type", "application/json")
            .body(body)
    }

    /// A plain-text response.
    pub fn text(status: u16, body: impl Into<Bytes>) -> Self {
        Self::new(status)
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body)
    }

    /// A redirect to `location`.
    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self::new(status).header("Location", location)
    }

    /// Adds a header. Repeated names produce repeated header lines.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replaces the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Gzip-compresses the current body and sets `Content-Encoding: gzip`.
    #[must_use]
    pub fn gzip(mut self) -> Self {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        match encoder.write_all(&self.body).and_then(|()| encoder.finish()) {
            Ok(compressed) => {
                self.body = Bytes::from(compressed);
                self.header("Content-Encoding", "gzip")
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to gzip mock body, serving it uncompressed");
                self
            }
        }
    }

    /// Waits before sending the response head.
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the first value of a header, ignoring name case.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the body as served, after any compression.
    #[must_use]
    pub fn body_bytes(&self) -> &Bytes {
        &self.body
    }

    pub(crate) fn delay_duration(&self) -> Option<Duration> {
        self.delay
    }

    /// Converts to a hyper response. Invalid header lines are skipped.
    pub(crate) fn to_http(&self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body.clone()));
        *response.status_mut() =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().append(name, value);
                }
                _ => tracing::warn!(name = %name, "Skipping invalid mock header"),
            }
        }
        response
    }
}
