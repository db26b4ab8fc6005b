//! # Courier
//!
//! **Async HTTP client built around an interceptor chain**
//!
//! Courier sends requests through an ordered pipeline of interceptors that
//! ends in a hyper-based transport, and hands back every outcome as a value:
//!
//! - **Interceptor chain** – Auth, logging and your own stages wrap each call
//!   in registration order on the way out and in reverse on the way back
//! - **Value outcomes** – `Success`, `Failure` (non-2xx) and `Error`
//!   (transport, decode, cancellation); calls never panic or throw
//! - **TLS pinning** – SHA-256 SPKI pins per host or wildcard, checked after
//!   every handshake and applied even when validation is relaxed
//! - **Configuration and telemetry** – TOML/JSON/env configuration,
//!   `tracing` logs and `metrics` counters for every call
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courier::prelude::*;
//!
//! #[derive(serde::Deserialize)]
//! struct Forecast {
//!     summary: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::builder()
//!         .base_url("https://api.example.com/")
//!         .logging(LogLevel::Basic)
//!         .build()?;
//!
//!     match client.get_json::<Forecast>("v1/forecast").await {
//!         HttpResponse::Success(s) => println!("{}", s.body.summary),
//!         HttpResponse::Failure(f) => eprintln!("HTTP {}", f.status_code),
//!         HttpResponse::Error(e) => eprintln!("call failed: {e}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! HttpClient::execute
//!   → resolve URL, merge default headers
//!   → Interceptor 1 → … → Interceptor N → HyperTransport
//!                                            (connect, TLS, pins, redirects)
//!   ← Interceptor 1 ← … ← Interceptor N ←────┘
//!   ← decode → HttpResponse<T>
//! ```

#![doc(html_root_url = "https://docs.rs/courier/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export request, response and outcome types
pub use courier_core as core;

// Re-export the interceptor chain and built-in stages
pub use courier_interceptor as interceptor;

// Re-export TLS policy and certificate pinning
pub use courier_tls as tls;

// Re-export the client and transport
pub use courier_client as client;

// Re-export configuration loading
pub use courier_config as config;

// Re-export logging and metrics
pub use courier_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use courier::prelude::*;
/// ```
pub mod prelude {
    pub use courier_core::{
        BodyDecoder, CallError, ContentType, Failure, Headers, HttpResponse, Json, Method,
        RawResponse, Request, RequestBuilder, ResponseHeaders, Success, Text, TransportFailure,
        TransportFailureKind,
    };

    // Re-export the interceptor chain
    pub use courier_interceptor::{
        AuthInterceptor, CallContext, FnInterceptor, Interceptor, LogLevel, LoggingInterceptor,
        Next, Pipeline, Terminal,
    };

    // Re-export TLS configuration
    pub use courier_tls::{CertificatePinner, Pin, TlsPolicy};

    // Re-export the client
    pub use courier_client::{ClientError, ClientResult, HttpClient, HttpClientBuilder};

    // Re-export configuration
    pub use courier_config::{ClientConfig, ConfigLoader};
}
