//! Ordered interceptor pipeline.
//!
//! A [`Pipeline`] holds the configured interceptors in registration order.
//! It is built once, shared read-only across calls, and for each call it is
//! combined with a terminal stage into a fresh [`Next`] chain.
//!
//! Interceptors see the request in registration order and the response in
//! reverse order:
//!
//! ```text
//! Pipeline [A, B] + Terminal
//!
//! A(pre) → B(pre) → Terminal → B(post) → A(post)
//! ```

use crate::context::CallContext;
use crate::interceptor::{BoxedInterceptor, Interceptor, Next, Terminal};
use courier_core::{RawResponse, Request};
use std::fmt;
use std::sync::Arc;

/// The configured interceptor list.
///
/// # Example
///
/// ```ignore
/// use courier_interceptor::{Pipeline, AuthInterceptor, LoggingInterceptor, LogLevel};
///
/// let pipeline = Pipeline::builder()
///     .add(AuthInterceptor::new(|| async { Some("token".to_string()) }))
///     .add(LoggingInterceptor::new(LogLevel::Basic))
///     .build();
///
/// let response = pipeline.process(&ctx, request, &transport).await;
/// ```
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<BoxedInterceptor>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs `request` through every interceptor and then `terminal`.
    pub async fn process(
        &self,
        ctx: &CallContext,
        request: Request,
        terminal: &dyn Terminal,
    ) -> RawResponse {
        self.chain(Some(terminal)).run(ctx, request).await
    }

    /// Builds the chain for one call.
    ///
    /// Passing `None` yields a chain that panics once the interceptors are
    /// exhausted.
    #[must_use]
    pub fn chain<'a>(&'a self, terminal: Option<&'a dyn Terminal>) -> Next<'a> {
        Next::new(&self.stages, terminal)
    }

    /// Returns the names of all interceptors in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Returns the number of interceptors.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if no interceptors are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedInterceptor>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor.
    #[must_use]
    pub fn add<I: Interceptor>(mut self, interceptor: I) -> Self {
        self.stages.push(Arc::new(interceptor));
        self
    }

    /// Appends an already shared interceptor.
    #[must_use]
    pub fn add_boxed(mut self, interceptor: BoxedInterceptor) -> Self {
        self.stages.push(interceptor);
        self
    }

    /// Builds the pipeline. The interceptor order is fixed from here on.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}
