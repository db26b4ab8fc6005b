//! # Courier Interceptor
//!
//! Chain-of-responsibility pipeline that wraps every Courier call.
//!
//! Interceptors are registered once on the client and run for each call
//! in registration order on the way out and reverse order on the way back.
//! The chain always ends in a [`Terminal`] stage supplied by the client,
//! which performs the actual exchange.
//!
//! ```text
//! Request → Auth → Logging → ... → Terminal (transport)
//!                                      ↓
//! RawResponse ← Auth ← Logging ← ... ←─┘
//! ```
//!
//! ## Key Types
//!
//! - [`Interceptor`] - A pipeline stage
//! - [`Next`] - Handle to the rest of the chain
//! - [`Terminal`] - The final stage that talks to the network
//! - [`Pipeline`] - The ordered, immutable interceptor list
//! - [`CallContext`] - Per-call ID and start time
//!
//! ## Example
//!
//! ```
//! use courier_interceptor::{AuthInterceptor, LogLevel, LoggingInterceptor, Pipeline};
//!
//! let pipeline = Pipeline::builder()
//!     .add(AuthInterceptor::new(|| async { Some("Bearer abc".to_string()) }))
//!     .add(LoggingInterceptor::new(LogLevel::Basic))
//!     .build();
//!
//! assert_eq!(pipeline.stage_names(), vec!["auth", "logging"]);
//! ```

#![doc(html_root_url = "https://docs.rs/courier-interceptor/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod interceptor;
pub mod pipeline;
pub mod stages;

// Re-export main types at crate root
pub use context::CallContext;
pub use interceptor::{BoxFuture, BoxedInterceptor, FnInterceptor, Interceptor, Next, Terminal};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use stages::auth::{AuthInterceptor, TokenProvider, AUTHORIZATION_HEADER};
pub use stages::logging::{LogLevel, LogSink, LoggingInterceptor, ParseLogLevelError};
