//! # Courier Core
//!
//! Value types shared by every Courier crate.
//!
//! - [`Request`] / [`RequestBuilder`] - Immutable outgoing request and its staged builder
//! - [`RawResponse`] - Transport-level result, including the `-1` failure sentinel
//! - [`ResponseHeaders`] - Case-insensitive, multi-valued header view
//! - [`HttpResponse`] - Three-way outcome: `Success`, `Failure` or `Error`
//! - [`BodyDecoder`] - Text passthrough and JSON decoding of 2xx bodies
//! - [`CallError`] - Classifiable cause carried by `HttpResponse::Error`

#![doc(html_root_url = "https://docs.rs/courier-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod decode;
mod error;
mod headers;
mod method;
mod outcome;
mod raw;
mod request;

pub use decode::{decode_response, BodyDecoder, Json, Text};
pub use error::{
    CallError, DecodeError, RequestError, ResponseError, TransportFailure, TransportFailureKind,
};
pub use headers::{HeaderValues, ResponseHeaders};
pub use method::Method;
pub use outcome::{Failure, HttpResponse, Success};
pub use raw::{RawResponse, TRANSPORT_FAILURE_STATUS};
pub use request::{
    ContentType, Headers, Request, RequestBuilder, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT,
};
