//! Authentication interceptor.
//!
//! Asks an async [`TokenProvider`] for a credential on every call and, when
//! one is available, sets it as a request header before delegating.
//!
//! The value is inserted verbatim: a provider that wants a scheme prefix
//! returns `"Bearer <token>"` itself.
//!
//! Injection is skipped, and the request passes through unchanged, when the
//! provider yields `None` or a blank string, or when the header name is blank.

use crate::context::CallContext;
use crate::interceptor::{BoxFuture, Interceptor, Next};
use courier_core::{RawResponse, Request};
use std::future::Future;
use std::sync::Arc;

/// The default header used for credentials.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Supplies the credential for a call.
///
/// Implemented for any `Fn() -> impl Future<Output = Option<String>>`.
pub trait TokenProvider: Send + Sync + 'static {
    /// Returns the current credential, or `None` to send the request without one.
    fn token(&self) -> BoxFuture<'_, Option<String>>;
}

impl<F, Fut> TokenProvider for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<String>> + Send + 'static,
{
    fn token(&self) -> BoxFuture<'_, Option<String>> {
        Box::pin(self())
    }
}

/// Interceptor that injects a credential header.
///
/// # Example
///
/// ```
/// use courier_interceptor::AuthInterceptor;
///
/// let auth = AuthInterceptor::new(|| async { Some("Bearer abc".to_string()) })
///     .with_header_name("X-Api-Key");
/// assert_eq!(auth.header_name(), "X-Api-Key");
/// ```
#[derive(Clone)]
pub struct AuthInterceptor {
    header_name: String,
    provider: Arc<dyn TokenProvider>,
}

impl AuthInterceptor {
    /// Creates an interceptor writing to the `Authorization` header.
    pub fn new(provider: impl TokenProvider) -> Self {
        Self {
            header_name: AUTHORIZATION_HEADER.to_string(),
            provider: Arc::new(provider),
        }
    }

    /// Uses a different header name.
    #[must_use]
    pub fn with_header_name(mut self, header_name: impl Into<String>) -> Self {
        self.header_name = header_name.into();
        self
    }

    /// Returns the header this interceptor writes.
    #[must_use]
    pub fn header_name(&self) -> &str {
        &self.header_name
    }
}

impl std::fmt::Debug for AuthInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthInterceptor")
            .field("header_name", &self.header_name)
            .finish_non_exhaustive()
    }
}

impl Interceptor for AuthInterceptor {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn intercept<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, RawResponse> {
        Box::pin(async move {
            let token = self.provider.token().await;
            let request = match token {
                Some(token) if !token.trim().is_empty() && !self.header_name.trim().is_empty() => {
                    request.with_header(self.header_name.clone(), token)
                }
                _ => {
                    tracing::debug!(
                        call_id = %ctx.call_id(),
                        header = %self.header_name,
                        "No credential available, sending request unauthenticated"
                    );
                    request
                }
            };
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::{BoxedInterceptor, Terminal};
    use courier_core::ResponseHeaders;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records the last request it received.
    #[derive(Default)]
    struct CapturingTerminal {
        seen: Mutex<Option<Request>>,
    }

    impl Terminal for CapturingTerminal {
        fn invoke<'a>(
            &'a self,
            _ctx: &'a CallContext,
            request: Request,
        ) -> BoxFuture<'a, RawResponse> {
            *self.seen.lock() = Some(request);
            Box::pin(async { RawResponse::new(204, None, ResponseHeaders::default(), "") })
        }
    }

    async fn run_with(auth: AuthInterceptor, request: Request) -> Request {
        let terminal = CapturingTerminal::default();
        let stages: Vec<BoxedInterceptor> = vec![Arc::new(auth)];
        let ctx = CallContext::new();
        let _ = Next::new(&stages, Some(&terminal)).run(&ctx, request).await;
        let seen = terminal.seen.lock().take();
        seen.expect("terminal was not reached")
    }

    fn request() -> Request {
        Request::builder("/secure").build().unwrap()
    }

    #[tokio::test]
    async fn test_injects_token() {
        let auth = AuthInterceptor::new(|| async { Some("Bearer abc".to_string()) });
        let seen = run_with(auth, request()).await;
        assert_eq!(seen.header("Authorization"), Some("Bearer abc"));
    }

    #[tokio::test]
    async fn test_custom_header_name() {
        let auth = AuthInterceptor::new(|| async { Some("key-123".to_string()) })
            .with_header_name("X-Api-Key");
        let seen = run_with(auth, request()).await;
        assert_eq!(seen.header("X-Api-Key"), Some("key-123"));
        assert!(seen.header("Authorization").is_none());
    }

    #[tokio::test]
    async fn test_skips_missing_or_blank_token() {
        let none = AuthInterceptor::new(|| async { None::<String> });
        assert!(run_with(none, request()).await.headers().is_empty());

        let blank = AuthInterceptor::new(|| async { Some("   ".to_string()) });
        assert!(run_with(blank, request()).await.headers().is_empty());
    }

    #[tokio::test]
    async fn test_skips_blank_header_name() {
        let auth = AuthInterceptor::new(|| async { Some("abc".to_string()) }).with_header_name(" ");
        assert!(run_with(auth, request()).await.headers().is_empty());
    }

    #[tokio::test]
    async fn test_provider_consulted_per_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let auth = AuthInterceptor::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { Some(format!("token-{n}")) }
        });

        let first = run_with(auth.clone(), request()).await;
        let second = run_with(auth, request()).await;
        assert_eq!(first.header("Authorization"), Some("token-0"));
        assert_eq!(second.header("Authorization"), Some("token-1"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
