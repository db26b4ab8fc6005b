//! # Courier Client
//!
//! The transport and the client façade of the Courier HTTP client.
//!
//! - [`HttpClient`] - Base URL, default headers, interceptors and TLS policy
//!   around a single `execute` entry point, plus `get`/`post`/`put`/`delete`
//! - [`HyperTransport`] - The terminal stage: one HTTP/1.1 connection per
//!   call over tokio, with tokio-rustls and certificate pinning for `https`,
//!   transparent gzip, bounded redirects and read/connect timeouts
//!
//! ## Call flow
//!
//! ```text
//! execute(request)
//!   → resolve against base URL, merge default headers
//!   → interceptors (registration order)
//!   → HyperTransport (connect, TLS, pins, send, buffer, gunzip)
//!   ← interceptors (reverse order)
//!   ← decode into HttpResponse<T>
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use courier_client::HttpClient;
//! use courier_core::{HttpResponse, Json};
//! use courier_interceptor::AuthInterceptor;
//!
//! let client = HttpClient::builder()
//!     .base_url("https://api.example.com/")
//!     .interceptor(AuthInterceptor::new(|| async { Some("Bearer abc".to_string()) }))
//!     .build()?;
//!
//! match client.get_json::<Forecast>("/v1/forecast").await {
//!     HttpResponse::Success(s) => println!("{:?}", s.body),
//!     HttpResponse::Failure(f) => eprintln!("HTTP {}", f.status_code),
//!     HttpResponse::Error(e) => eprintln!("call failed: {e}"),
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/courier-client/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
pub mod redirect;
mod transport;

pub use client::{HttpClient, HttpClientBuilder, DEFAULT_USER_AGENT};
pub use error::{ClientError, ClientResult};
pub use redirect::DEFAULT_MAX_REDIRECTS;
pub use transport::HyperTransport;
