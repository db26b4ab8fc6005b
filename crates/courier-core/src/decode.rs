//! Turning a [`RawResponse`] into an [`HttpResponse`].
//!
//! The caller picks the target by passing a [`BodyDecoder`]:
//!
//! - [`Text`] returns the body text as-is, whatever the content type.
//! - [`Json`] deserializes the body with `serde_json`, and only accepts
//!   responses whose `Content-Type` is JSON.
//!
//! Byte-to-text conversion always uses the `Content-Type` charset, with
//! UTF-8 as the fallback.

use crate::error::{CallError, DecodeError, TransportFailure};
use crate::headers::ResponseHeaders;
use crate::outcome::{Failure, HttpResponse, Success};
use crate::raw::RawResponse;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Decodes 2xx body text into a typed value.
pub trait BodyDecoder: Send + Sync {
    /// The decoded type.
    type Output;

    /// Decodes `text`, already converted from bytes with the response charset.
    fn decode(&self, text: &str, headers: &ResponseHeaders) -> Result<Self::Output, DecodeError>;
}

/// Passes the body text through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Text;

impl BodyDecoder for Text {
    type Output = String;

    fn decode(&self, text: &str, _headers: &ResponseHeaders) -> Result<String, DecodeError> {
        Ok(text.to_string())
    }
}

/// Deserializes a JSON body into `T`.
pub struct Json<T>(PhantomData<fn() -> T>);

impl<T> Json<T> {
    /// Creates a JSON decoder for `T`.
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Json<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Json<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Json<T> {}

impl<T> std::fmt::Debug for Json<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Json<{}>", std::any::type_name::<T>())
    }
}

impl<T: DeserializeOwned> BodyDecoder for Json<T> {
    type Output = T;

    fn decode(&self, text: &str, headers: &ResponseHeaders) -> Result<T, DecodeError> {
        if !headers.is_json() {
            return Err(DecodeError::UnsupportedContentType {
                content_type: headers.content_type().unwrap_or("none").to_string(),
                target: std::any::type_name::<T>(),
            });
        }
        Ok(serde_json::from_str(text)?)
    }
}

/// Maps a raw response to the call outcome.
///
/// - 2xx: decoded with `decoder`; a decode error becomes
///   [`HttpResponse::Error`].
/// - The sentinel status: [`HttpResponse::Error`] with the transport cause.
/// - Any other status: [`HttpResponse::Failure`] carrying the body text.
pub fn decode_response<D: BodyDecoder>(raw: RawResponse, decoder: &D) -> HttpResponse<D::Output> {
    if let Some(failure) = raw.failure() {
        return HttpResponse::Error(CallError::Transport(failure));
    }

    let Ok(status_code) = u16::try_from(raw.status()) else {
        return HttpResponse::Error(CallError::Transport(TransportFailure::protocol(format!(
            "invalid status code {}",
            raw.status()
        ))));
    };

    let text = raw.text();
    if raw.is_success() {
        return match decoder.decode(&text, raw.headers()) {
            Ok(body) => HttpResponse::Success(Success {
                body,
                status_code,
                headers: raw.headers().clone(),
                raw_body: text,
            }),
            Err(e) => HttpResponse::Error(CallError::Decode(e)),
        };
    }

    HttpResponse::Failure(Failure {
        status_code,
        message: raw.message().unwrap_or("HTTP Error").to_string(),
        error_body: Some(text),
        headers: raw.headers().clone(),
    })
}
