//! # Courier Test
//!
//! Test utilities for the Courier HTTP client.
//!
//! ## Key Features
//!
//! - **Mock Server**: Real HTTP/1.1 server on `127.0.0.1`, optionally over TLS
//! - **Scripted Responses**: Status, headers, body, gzip, delay and redirects
//! - **Request Capture**: Every request the server received, for assertions
//! - **Stalling Server**: Accepts and never answers, for timeout and
//!   cancellation tests
//! - **Terminal Double**: [`ScriptedTerminal`] runs a pipeline without a network
//! - **Certificates**: Self-signed `localhost` certificates and their pins
//!
//! ## Example
//!
//! ```ignore
//! use courier_test::{MockResponse, MockServer, SelfSignedCert};
//!
//! #[tokio::test]
//! async fn test_pinned_call() {
//!     let cert = SelfSignedCert::localhost().unwrap();
//!     let server = MockServer::start_tls(&cert).await.unwrap();
//!     server.mock("/ping", MockResponse::text(200, "pong"));
//!
//!     // Trust `cert.certificate()` and pin `cert.pin()` for "localhost",
//!     // then call `server.url("/ping")`.
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/courier-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod certs;
mod error;
mod response;
mod server;
mod terminal;

pub use certs::SelfSignedCert;
pub use error::TestError;
pub use response::MockResponse;
pub use server::{MockServer, ReceivedRequest, StallingServer};
pub use terminal::ScriptedTerminal;
