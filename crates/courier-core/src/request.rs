//! Request value and its builder.
//!
//! A [`Request`] is an immutable value. Interceptors that need to change it
//! consume it and produce a new one with the `with_*` methods.
//!
//! # Example
//!
//! ```
//! use courier_core::{ContentType, Method, Request};
//!
//! let request = Request::builder("https://api.example.com/v1/forecast")
//!     .query_param("latitude", "38.64")
//!     .query_param("hourly", "temperature_2m,rain")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(
//!     request.url(),
//!     "https://api.example.com/v1/forecast?latitude=38.64&hourly=temperature_2m,rain"
//! );
//! assert_eq!(request.method(), Method::Get);
//!
//! let post = Request::builder("/items")
//!     .method(Method::Post)
//!     .text_body("hello")
//!     .build()
//!     .unwrap();
//! assert_eq!(post.content_type(), Some(ContentType::TextPlain));
//! assert_eq!(post.header("Content-Type"), Some("text/plain"));
//! ```

use crate::error::RequestError;
use crate::method::Method;
use bytes::Bytes;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use url::form_urlencoded;

/// Default connect timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Default read timeout (20 seconds).
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Request header map. Keys are case-sensitive at this layer and keep
/// insertion order.
pub type Headers = IndexMap<String, String>;

/// The declared type of a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// `application/json`
    Json,
    /// `application/x-www-form-urlencoded`
    FormUrlEncoded,
    /// `text/plain`
    TextPlain,
}

impl ContentType {
    /// Returns the MIME type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::TextPlain => "text/plain",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully assembled HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    url: String,
    method: Method,
    headers: Headers,
    connect_timeout: Duration,
    read_timeout: Duration,
    body: Option<Bytes>,
    content_type: Option<ContentType>,
}

impl Request {
    /// Creates a builder for a request to `url`.
    pub fn builder(url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new().url(url)
    }

    /// Returns the request URL (absolute, or relative to the client base URL).
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the method.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Returns all headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the value of the header with exactly this name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Returns the value of the first header matching `name` in any case.
    #[must_use]
    pub fn header_ignore_case(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the read timeout.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Returns the body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Returns the declared body content type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<ContentType> {
        self.content_type
    }

    /// Returns true if a body is present and the method permits sending it.
    #[must_use]
    pub fn has_sendable_body(&self) -> bool {
        self.method.allows_body() && self.body.is_some()
    }

    /// Returns this request with a different URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Returns this request with `name` set to `value`, replacing any
    /// header with exactly the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Returns this request with its headers replaced.
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Returns this request without the header named `name` (any case).
    #[must_use]
    pub fn without_header(mut self, name: &str) -> Self {
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
        self
    }

    /// Returns this request with a different method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Returns this request without a body or declared content type.
    #[must_use]
    pub fn without_body(mut self) -> Self {
        self.body = None;
        self.content_type = None;
        self
    }
}

/// Staged construction of a [`Request`].
///
/// Body setters are mutually exclusive: the last one called wins, and each
/// also sets the matching `Content-Type` header.
#[derive(Debug)]
pub struct RequestBuilder {
    url: String,
    method: Method,
    headers: Headers,
    query_params: IndexMap<String, String>,
    connect_timeout: Duration,
    read_timeout: Duration,
    body: Option<Bytes>,
    content_type: Option<ContentType>,
    error: Option<RequestError>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    /// Creates an empty builder: `GET`, no URL, default timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self {
            url: String::new(),
            method: Method::Get,
            headers: Headers::new(),
            query_params: IndexMap::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            body: None,
            content_type: None,
            error: None,
        }
    }

    /// Sets the URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets a header, replacing a previous value with the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets several headers at once.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.headers.insert(name.into(), value.into());
        }
        self
    }

    /// Adds a query parameter. A later parameter with the same key replaces
    /// the earlier value but keeps its position.
    pub fn query_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query_params.insert(key.into(), value.to_string());
        self
    }

    /// Adds several query parameters at once.
    pub fn query_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        for (key, value) in params {
            self.query_params.insert(key.into(), value.to_string());
        }
        self
    }

    /// Uses `json` verbatim as an `application/json` body.
    pub fn json_body(self, json: impl Into<String>) -> Self {
        self.body_with_type(Bytes::from(json.into()), ContentType::Json)
    }

    /// Serializes `value` as an `application/json` body.
    ///
    /// A serialization failure is reported by [`build`](Self::build).
    pub fn json_value<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body_with_type(Bytes::from(bytes), ContentType::Json),
            Err(e) => {
                self.error = Some(RequestError::Json(e));
                self
            }
        }
    }

    /// Encodes `pairs` as an `application/x-www-form-urlencoded` body.
    pub fn form_body<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.body_with_type(Bytes::from(encoded), ContentType::FormUrlEncoded)
    }

    /// Uses `text` as a `text/plain` body.
    pub fn text_body(self, text: impl Into<String>) -> Self {
        self.body_with_type(Bytes::from(text.into()), ContentType::TextPlain)
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Finalizes the request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::EmptyUrl`] if no URL was set, or the error
    /// recorded by a failed [`json_value`](Self::json_value).
    pub fn build(self) -> Result<Request, RequestError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.url.is_empty() {
            return Err(RequestError::EmptyUrl);
        }

        Ok(Request {
            url: append_query(&self.url, &self.query_params),
            method: self.method,
            headers: self.headers,
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            body: self.body,
            content_type: self.content_type,
        })
    }

    fn body_with_type(mut self, body: Bytes, content_type: ContentType) -> Self {
        self.body = Some(body);
        self.content_type = Some(content_type);
        self.headers
            .insert("Content-Type".to_string(), content_type.as_str().to_string());
        self
    }
}

// Commas stay literal in values; some APIs use them as an in-value separator.
fn append_query(url: &str, params: &IndexMap<String, String>) -> String {
    if params.is_empty() {
        return url.to_string();
    }

    let query = params
        .iter()
        .map(|(key, value)| {
            let key: String = form_urlencoded::byte_serialize(key.as_bytes()).collect();
            let value: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
            format!("{key}={}", value.replace("%2C", ","))
        })
        .collect::<Vec<_>>()
        .join("&");

    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = Request::builder("https://example.com").build().unwrap();
        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.connect_timeout(), Duration::from_millis(10_000));
        assert_eq!(request.read_timeout(), Duration::from_millis(20_000));
        assert!(request.body().is_none());
        assert!(request.headers().is_empty());
    }

    #[test]
    fn test_empty_url_is_rejected() {
        let result = RequestBuilder::new().build();
        assert!(matches!(result, Err(RequestError::EmptyUrl)));
    }

    #[test]
    fn test_query_params_preserve_commas() {
        let request = Request::builder("https://api.example.com/v1/forecast")
            .query_param("latitude", 38.64)
            .query_param("longitude", 34.73)
            .query_param("hourly", "temperature_2m,relative_humidity_2m")
            .build()
            .unwrap();

        assert_eq!(
            request.url(),
            "https://api.example.com/v1/forecast?latitude=38.64&longitude=34.73\
             &hourly=temperature_2m,relative_humidity_2m"
        );
    }

    #[test]
    fn test_query_params_append_to_existing_query() {
        let request = Request::builder("/search?q=rust")
            .query_param("page", 2)
            .build()
            .unwrap();
        assert_eq!(request.url(), "/search?q=rust&page=2");
    }

    #[test]
    fn test_query_params_are_encoded() {
        let request = Request::builder("/search")
            .query_param("q", "a b&c")
            .build()
            .unwrap();
        assert_eq!(request.url(), "/search?q=a+b%26c");
    }

    #[test]
    fn test_later_query_param_replaces_earlier() {
        let request = Request::builder("/x")
            .query_params([("a", "1"), ("b", "2")])
            .query_param("a", "3")
            .build()
            .unwrap();
        assert_eq!(request.url(), "/x?a=3&b=2");
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let request = Request::builder("/items")
            .method(Method::Post)
            .json_body(r#"{"name":"courier"}"#)
            .build()
            .unwrap();

        assert_eq!(request.content_type(), Some(ContentType::Json));
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.body().unwrap().as_ref(), br#"{"name":"courier"}"#);
        assert!(request.has_sendable_body());
    }

    #[test]
    fn test_json_value_serializes() {
        #[derive(Serialize)]
        struct Item {
            id: u32,
        }

        let request = Request::builder("/items")
            .method(Method::Put)
            .json_value(&Item { id: 7 })
            .build()
            .unwrap();
        assert_eq!(request.body().unwrap().as_ref(), br#"{"id":7}"#);
    }

    #[test]
    fn test_form_body_is_url_encoded() {
        let request = Request::builder("/login")
            .method(Method::Post)
            .form_body([("user", "jane doe"), ("pass", "p&ss")])
            .build()
            .unwrap();

        assert_eq!(request.content_type(), Some(ContentType::FormUrlEncoded));
        assert_eq!(
            request.header("Content-Type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(request.body().unwrap().as_ref(), b"user=jane+doe&pass=p%26ss");
    }

    #[test]
    fn test_last_body_setter_wins() {
        let request = Request::builder("/notes")
            .method(Method::Post)
            .json_body("{}")
            .text_body("plain")
            .build()
            .unwrap();
        assert_eq!(request.content_type(), Some(ContentType::TextPlain));
        assert_eq!(request.header("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn test_body_on_get_is_kept_but_not_sendable() {
        let request = Request::builder("/x").text_body("ignored").build().unwrap();
        assert!(request.body().is_some());
        assert!(!request.has_sendable_body());
    }

    #[test]
    fn test_with_header_and_lookup() {
        let request = Request::builder("/x")
            .header("X-Trace", "1")
            .build()
            .unwrap()
            .with_header("Authorization", "token");

        assert_eq!(request.header("Authorization"), Some("token"));
        assert_eq!(request.header("authorization"), None);
        assert_eq!(request.header_ignore_case("authorization"), Some("token"));

        let stripped = request.without_header("AUTHORIZATION");
        assert!(stripped.header("Authorization").is_none());
        assert_eq!(stripped.header("X-Trace"), Some("1"));
    }
}
