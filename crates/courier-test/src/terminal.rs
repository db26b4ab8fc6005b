//! A [`Terminal`] double for pipeline tests.

use courier_core::{RawResponse, Request, ResponseHeaders};
use courier_interceptor::{BoxFuture, CallContext, Terminal};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Returns canned responses and records every request it receives.
///
/// Responses are served in order; the last one repeats once the script is
/// exhausted. An empty script answers `200` with an empty body.
///
/// # Example
///
/// ```
/// use courier_core::{RawResponse, ResponseHeaders};
/// use courier_test::ScriptedTerminal;
///
/// let terminal = ScriptedTerminal::new([
///     RawResponse::new(503, None, ResponseHeaders::default(), ""),
///     RawResponse::new(200, None, ResponseHeaders::default(), "ok"),
/// ]);
/// assert_eq!(terminal.calls(), 0);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedTerminal {
    script: Mutex<VecDeque<RawResponse>>,
    seen: Mutex<Vec<Request>>,
}

impl ScriptedTerminal {
    /// Creates a terminal serving `responses` in order.
    pub fn new(responses: impl IntoIterator<Item = RawResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Creates a terminal that always answers with `response`.
    #[must_use]
    pub fn always(response: RawResponse) -> Self {
        Self::new([response])
    }

    /// Creates a terminal that always answers `status` with a JSON body.
    #[must_use]
    pub fn json(status: i32, body: &str) -> Self {
        let headers = ResponseHeaders::from_pairs([("Content-Type", "application/json")]);
        Self::always(RawResponse::new(status, None, headers, body.to_string()))
    }

    /// Returns the requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.seen.lock().clone()
    }

    /// Returns the most recent request.
    #[must_use]
    pub fn last_request(&self) -> Option<Request> {
        self.seen.lock().last().cloned()
    }

    /// Returns how many times the terminal was invoked.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }

    fn next_response(&self) -> RawResponse {
        let mut script = self.script.lock();
        if script.len() > 1 {
            script.pop_front().unwrap_or_else(empty_ok)
        } else {
            script.front().cloned().unwrap_or_else(empty_ok)
        }
    }
}

fn empty_ok() -> RawResponse {
    RawResponse::new(200, None, ResponseHeaders::default(), "")
}

impl Terminal for ScriptedTerminal {
    fn invoke<'a>(&'a self, _ctx: &'a CallContext, request: Request) -> BoxFuture<'a, RawResponse> {
        self.seen.lock().push(request);
        let response = self.next_response();
        Box::pin(async move { response })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_interceptor::{FnInterceptor, Pipeline};

    fn request() -> Request {
        Request::builder("https://api.example.com/x").build().unwrap()
    }

    #[tokio::test]
    async fn test_serves_script_then_repeats_last() {
        let terminal = ScriptedTerminal::new([
            RawResponse::new(503, None, ResponseHeaders::default(), ""),
            RawResponse::new(200, None, ResponseHeaders::default(), "ok"),
        ]);
        let pipeline = Pipeline::builder().build();
        let ctx = CallContext::new();

        let mut statuses = Vec::new();
        for _ in 0..3 {
            statuses.push(pipeline.process(&ctx, request(), &terminal).await.status());
        }
        assert_eq!(statuses, vec![503, 200, 200]);
        assert_eq!(terminal.calls(), 3);
    }

    #[tokio::test]
    async fn test_interceptor_can_run_rest_of_chain_twice() {
        let terminal = ScriptedTerminal::new([
            RawResponse::new(503, None, ResponseHeaders::default(), "busy"),
            RawResponse::new(200, None, ResponseHeaders::default(), "ok"),
        ]);
        let retry_once = FnInterceptor::new("retry", |ctx, request, next| {
            Box::pin(async move {
                let first = next.run(ctx, request.clone()).await;
                if first.status() == 503 {
                    next.run(ctx, request.with_header("X-Retry", "1")).await
                } else {
                    first
                }
            })
        });
        let pipeline = Pipeline::builder().add(retry_once).build();

        let response = pipeline.process(&CallContext::new(), request(), &terminal).await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.body().as_ref(), b"ok");
        assert_eq!(terminal.calls(), 2);
        assert_eq!(terminal.last_request().unwrap().header("X-Retry"), Some("1"));
    }

    #[tokio::test]
    async fn test_records_requests() {
        let terminal = ScriptedTerminal::json(200, "{}");
        let ctx = CallContext::new();
        let _ = terminal
            .invoke(&ctx, request().with_header("X-Seen", "yes"))
            .await;

        let last = terminal.last_request().unwrap();
        assert_eq!(last.header("X-Seen"), Some("yes"));
        assert_eq!(terminal.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_script_answers_ok() {
        let terminal = ScriptedTerminal::default();
        let response = terminal.invoke(&CallContext::new(), request()).await;
        assert_eq!(response.status(), 200);
        assert!(response.body().is_empty());
    }
}
