//! Test error types.

use std::fmt;

/// Errors that can occur while setting up test fixtures.
#[derive(Debug)]
pub enum TestError {
    /// Binding the listener failed
    Bind(std::io::Error),
    /// Certificate generation failed
    Certificate(String),
    /// Server TLS configuration was rejected
    Tls(rustls::Error),
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind(e) => write!(f, "Bind error: {e}"),
            Self::Certificate(msg) => write!(f, "Certificate error: {msg}"),
            Self::Tls(e) => write!(f, "TLS config error: {e}"),
        }
    }
}

impl std::error::Error for TestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bind(e) => Some(e),
            Self::Tls(e) => Some(e),
            Self::Certificate(_) => None,
        }
    }
}

impl From<std::io::Error> for TestError {
    fn from(e: std::io::Error) -> Self {
        Self::Bind(e)
    }
}

impl From<rustls::Error> for TestError {
    fn from(e: rustls::Error) -> Self {
        Self::Tls(e)
    }
}

impl From<rcgen::Error> for TestError {
    fn from(e: rcgen::Error) -> Self {
        Self::Certificate(e.to_string())
    }
}
