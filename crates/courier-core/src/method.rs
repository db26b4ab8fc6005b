//! HTTP request methods.

use std::fmt;

/// The HTTP methods a [`Request`](crate::Request) can carry.
///
/// Each method records whether a request body is permitted. A body attached
/// to a body-less method is kept on the value but never written to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// `GET`, no body.
    #[default]
    Get,
    /// `POST`, body permitted.
    Post,
    /// `PUT`, body permitted.
    Put,
    /// `DELETE`, body permitted.
    Delete,
}

impl Method {
    /// Returns the method token as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Returns true if a request body may be written for this method.
    #[must_use]
    pub const fn allows_body(self) -> bool {
        !matches!(self, Self::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
        }
    }
}
