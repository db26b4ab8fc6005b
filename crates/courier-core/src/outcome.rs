//! The three-way call outcome.
//!
//! Every call ends in exactly one [`HttpResponse`] variant:
//!
//! ```text
//! RawResponse ──► 2xx, decoded ──────────► Success { body, status, headers, raw }
//!            ├──► 2xx, decode failed ────► Error(Decode)
//!            ├──► status -1 ─────────────► Error(Transport)
//!            └──► any other status ──────► Failure { status, message, body, headers }
//! ```

use crate::error::{CallError, ResponseError};
use crate::headers::ResponseHeaders;

/// A decoded 2xx response.
#[derive(Debug, Clone, PartialEq)]
pub struct Success<T> {
    /// The decoded body.
    pub body: T,
    /// The received status code.
    pub status_code: u16,
    /// The response headers.
    pub headers: ResponseHeaders,
    /// The body text before decoding.
    pub raw_body: String,
}

impl<T> Success<T> {
    /// Transforms the decoded body, keeping status, headers and raw text.
    pub fn map<R>(self, f: impl FnOnce(T) -> R) -> Success<R> {
        Success {
            body: f(self.body),
            status_code: self.status_code,
            headers: self.headers,
            raw_body: self.raw_body,
        }
    }
}

/// An HTTP-level failure: the peer answered with a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// The received status code.
    pub status_code: u16,
    /// The status message, or `HTTP Error` when none was given.
    pub message: String,
    /// The raw response text.
    pub error_body: Option<String>,
    /// The response headers.
    pub headers: ResponseHeaders,
}

impl Failure {
    /// Returns true for a 4xx status.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..=499).contains(&self.status_code)
    }

    /// Returns true for a 5xx status.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        (500..=599).contains(&self.status_code)
    }
}

/// The outcome of one call.
///
/// # Example
///
/// ```
/// use courier_core::{HttpResponse, Success, ResponseHeaders};
///
/// let response: HttpResponse<u32> = HttpResponse::Success(Success {
///     body: 21,
///     status_code: 200,
///     headers: ResponseHeaders::default(),
///     raw_body: "21".to_string(),
/// });
///
/// let doubled = response.map(|n| n * 2);
/// assert_eq!(doubled.ok(), Some(42));
/// ```
#[derive(Debug)]
pub enum HttpResponse<T> {
    /// A 2xx response decoded into `T`.
    Success(Success<T>),
    /// A non-2xx response.
    Failure(Failure),
    /// No usable response: transport failure, decode failure or cancellation.
    Error(CallError),
}

impl<T> HttpResponse<T> {
    /// Returns true for [`HttpResponse::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns true for [`HttpResponse::Failure`].
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Returns true for [`HttpResponse::Error`].
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Returns the received status code; `None` for errors.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Success(success) => Some(success.status_code),
            Self::Failure(failure) => Some(failure.status_code),
            Self::Error(_) => None,
        }
    }

    /// Returns the headers of a received response.
    #[must_use]
    pub fn headers(&self) -> Option<&ResponseHeaders> {
        match self {
            Self::Success(success) => Some(&success.headers),
            Self::Failure(failure) => Some(&failure.headers),
            Self::Error(_) => None,
        }
    }

    /// Returns true for a 4xx failure.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Failure(f) if f.is_client_error())
    }

    /// Returns true for a 5xx failure.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Failure(f) if f.is_server_error())
    }

    /// Returns true for an error caused by the network.
    #[must_use]
    pub fn is_network_error(&self) -> bool {
        matches!(self, Self::Error(e) if e.is_network_error())
    }

    /// Returns true for an error caused by an elapsed deadline.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Error(e) if e.is_timeout())
    }

    /// Runs `action` on the decoded body of a success.
    pub fn on_success(self, action: impl FnOnce(&T)) -> Self {
        if let Self::Success(success) = &self {
            action(&success.body);
        }
        self
    }

    /// Runs `action` on a failure.
    pub fn on_failure(self, action: impl FnOnce(&Failure)) -> Self {
        if let Self::Failure(failure) = &self {
            action(failure);
        }
        self
    }

    /// Runs `action` on an error.
    pub fn on_error(self, action: impl FnOnce(&CallError)) -> Self {
        if let Self::Error(error) = &self {
            action(error);
        }
        self
    }

    /// Transforms the body of a success.
    pub fn map<R>(self, f: impl FnOnce(T) -> R) -> HttpResponse<R> {
        match self {
            Self::Success(success) => HttpResponse::Success(success.map(f)),
            Self::Failure(failure) => HttpResponse::Failure(failure),
            Self::Error(error) => HttpResponse::Error(error),
        }
    }

    /// Collapses the outcome into one value.
    pub fn fold<R>(
        self,
        on_success: impl FnOnce(T) -> R,
        on_failure: impl FnOnce(Failure) -> R,
        on_error: impl FnOnce(CallError) -> R,
    ) -> R {
        match self {
            Self::Success(success) => on_success(success.body),
            Self::Failure(failure) => on_failure(failure),
            Self::Error(error) => on_error(error),
        }
    }

    /// Returns the decoded body, or `None`.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Success(success) => Some(success.body),
            _ => None,
        }
    }

    /// Returns the decoded body, or `default`.
    pub fn unwrap_or(self, default: T) -> T {
        self.ok().unwrap_or(default)
    }

    /// Returns the decoded body, or computes one.
    pub fn unwrap_or_else(self, f: impl FnOnce() -> T) -> T {
        self.ok().unwrap_or_else(f)
    }

    /// Converts into a `Result`, turning failures and errors into [`ResponseError`].
    pub fn into_result(self) -> Result<T, ResponseError> {
        match self {
            Self::Success(success) => Ok(success.body),
            Self::Failure(failure) => Err(ResponseError::Http {
                status: failure.status_code,
                message: failure.message,
                body: failure.error_body,
            }),
            Self::Error(error) => Err(ResponseError::Call(error)),
        }
    }
}
