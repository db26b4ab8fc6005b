//! Core interceptor traits and the rest-of-chain handle.
//!
//! An [`Interceptor`] receives the current request and a [`Next`] handle for
//! the remainder of the chain. It may rewrite the request before delegating,
//! inspect or rewrite the response after delegating, or return a synthetic
//! response without delegating at all.
//!
//! The last element of every chain is a [`Terminal`] stage that performs the
//! exchange. It has no `Next` and so cannot delegate further.
//!
//! ```text
//! request ──► A ──► B ──► Terminal
//!                          │
//! response ◄── A ◄── B ◄───┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use courier_interceptor::{BoxFuture, CallContext, Interceptor, Next};
//! use courier_core::{RawResponse, Request};
//!
//! struct UserAgent;
//!
//! impl Interceptor for UserAgent {
//!     fn name(&self) -> &'static str {
//!         "user_agent"
//!     }
//!
//!     fn intercept<'a>(
//!         &'a self,
//!         ctx: &'a CallContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, RawResponse> {
//!         Box::pin(async move {
//!             next.run(ctx, request.with_header("User-Agent", "demo/1.0")).await
//!         })
//!     }
//! }
//! ```

use crate::context::CallContext;
use courier_core::{RawResponse, Request};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased interceptor that can be stored in a pipeline.
pub type BoxedInterceptor = Arc<dyn Interceptor>;

/// A stage in the request/response pipeline.
///
/// # Invariants
///
/// - Not calling `next.run()` short-circuits the chain with the
///   interceptor's own response; calling it again re-runs the rest of the
///   chain, as a retry does
/// - Transport failures arrive as sentinel [`RawResponse`]s and are passed
///   back up like any other response
pub trait Interceptor: Send + Sync + 'static {
    /// Returns the name of this stage, used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Processes `request`, usually by delegating to `next`.
    fn intercept<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, RawResponse>;
}

/// The final chain element: performs the network exchange.
///
/// Implementations report every transport failure as a sentinel
/// [`RawResponse`] and never panic on I/O errors.
pub trait Terminal: Send + Sync {
    /// Performs the exchange for a fully resolved request.
    fn invoke<'a>(&'a self, ctx: &'a CallContext, request: Request)
        -> BoxFuture<'a, RawResponse>;
}

/// Handle to the rest of the chain.
///
/// Holds a borrowed slice of the remaining interceptors plus the terminal
/// stage. It is built fresh for each call and is `Copy`, so an interceptor
/// may run the rest of the chain more than once (to retry, for example).
#[derive(Clone, Copy)]
pub struct Next<'a> {
    stages: &'a [BoxedInterceptor],
    terminal: Option<&'a dyn Terminal>,
}

impl<'a> Next<'a> {
    /// Creates a handle over `stages` followed by `terminal`.
    ///
    /// A chain without a terminal is a misconfiguration: running past the
    /// last interceptor panics.
    #[must_use]
    pub fn new(stages: &'a [BoxedInterceptor], terminal: Option<&'a dyn Terminal>) -> Self {
        Self { stages, terminal }
    }

    /// Returns the number of interceptors left before the terminal stage.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.stages.len()
    }

    /// Invokes the next interceptor, or the terminal stage once none remain.
    ///
    /// # Panics
    ///
    /// Panics if the interceptors are exhausted and no terminal stage was
    /// supplied.
    pub async fn run(self, ctx: &'a CallContext, request: Request) -> RawResponse {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                let next = Next::new(rest, self.terminal);
                stage.intercept(ctx, request, next).await
            }
            None => match self.terminal {
                Some(terminal) => terminal.invoke(ctx, request).await,
                None => panic!("interceptor chain exhausted: no terminal stage"),
            },
        }
    }
}

/// An interceptor built from a closure.
///
/// # Example
///
/// ```
/// use courier_interceptor::FnInterceptor;
///
/// let tag = FnInterceptor::new("tag", |ctx, request, next| {
///     Box::pin(async move { next.run(ctx, request.with_header("X-Tag", "1")).await })
/// });
/// # let _ = tag;
/// ```
pub struct FnInterceptor<F> {
    name: &'static str,
    func: F,
}

impl<F> FnInterceptor<F>
where
    F: for<'a> Fn(&'a CallContext, Request, Next<'a>) -> BoxFuture<'a, RawResponse>
        + Send
        + Sync
        + 'static,
{
    /// Creates a closure-based interceptor.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Interceptor for FnInterceptor<F>
where
    F: for<'a> Fn(&'a CallContext, Request, Next<'a>) -> BoxFuture<'a, RawResponse>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn intercept<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, RawResponse> {
        (self.func)(ctx, request, next)
    }
}
