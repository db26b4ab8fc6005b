//! HTTP logging interceptor.
//!
//! Renders each exchange as a block of lines:
//!
//! ```text
//! ╔═══════════════════════════════════════════════════════════════
//! ║ REQUEST
//! ╠═══════════════════════════════════════════════════════════════
//! GET https://api.example.com/v1/forecast
//! ┌─ Headers                        (Headers and Body levels)
//!   Accept: application/json
//! ╔═══════════════════════════════════════════════════════════════
//! ║ RESPONSE
//! ╠═══════════════════════════════════════════════════════════════
//! ✓ 200 OK (42ms)
//! ┌─ Response Body                  (Body level)
//!   {
//!     "latitude": 38.64
//!   }
//! ╚═══════════════════════════════════════════════════════════════
//! ```
//!
//! Bodies are already fully buffered when they reach this interceptor, so
//! logging reads them without affecting what the decoder later sees.
//! JSON-looking bodies are pretty-printed; response bodies are capped at
//! [`MAX_LOGGED_BODY_CHARS`] characters.
//!
//! Lines go to `tracing` at `INFO` on the `courier::http` target unless a
//! custom sink is installed.

use crate::context::CallContext;
use crate::interceptor::{BoxFuture, Interceptor, Next};
use courier_core::{RawResponse, Request};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Maximum number of response body characters written to the log.
pub const MAX_LOGGED_BODY_CHARS: usize = 10_000;

/// Tracing target used by the default sink.
pub const LOG_TARGET: &str = "courier::http";

const RULE: &str = "═══════════════════════════════════════════════════════════════";

/// How much of each exchange to log. Each level includes the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Nothing is logged.
    None,
    /// Request line, response status and timing.
    #[default]
    Basic,
    /// Adds request and response headers.
    Headers,
    /// Adds request and response bodies.
    Body,
}

impl LogLevel {
    /// Returns the lowercase level name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Basic => "basic",
            Self::Headers => "headers",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`LogLevel`] name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log level '{0}', expected none, basic, headers or body")]
pub struct ParseLogLevelError(String);

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "basic" => Ok(Self::Basic),
            "headers" => Ok(Self::Headers),
            "body" => Ok(Self::Body),
            _ => Err(ParseLogLevelError(s.to_string())),
        }
    }
}

/// Destination for rendered log lines.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Interceptor that logs requests and responses.
///
/// # Example
///
/// ```
/// use courier_interceptor::{LogLevel, LoggingInterceptor};
/// use std::sync::Arc;
///
/// let logging = LoggingInterceptor::new(LogLevel::Headers)
///     .with_sink(Arc::new(|line: &str| eprintln!("{line}")));
/// assert_eq!(logging.level(), LogLevel::Headers);
/// ```
#[derive(Clone)]
pub struct LoggingInterceptor {
    level: LogLevel,
    sink: Option<LogSink>,
}

impl LoggingInterceptor {
    /// Creates a logging interceptor at `level`, writing to `tracing`.
    #[must_use]
    pub fn new(level: LogLevel) -> Self {
        Self { level, sink: None }
    }

    /// Sends lines to `sink` instead of `tracing`.
    #[must_use]
    pub fn with_sink(mut self, sink: LogSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Returns the configured level.
    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    fn emit(&self, ctx: &CallContext, line: &str) {
        match &self.sink {
            Some(sink) => sink(line),
            None => tracing::info!(target: LOG_TARGET, call_id = %ctx.call_id(), "{line}"),
        }
    }

    fn log_request(&self, ctx: &CallContext, request: &Request) {
        self.emit_banner(ctx, "REQUEST");
        self.emit(ctx, &format!("{} {}", request.method(), request.url()));

        if self.level >= LogLevel::Headers && !request.headers().is_empty() {
            self.emit(ctx, "┌─ Headers");
            for (name, value) in request.headers() {
                self.emit(ctx, &format!("  {name}: {value}"));
            }
        }

        if self.level >= LogLevel::Body {
            if let Some(body) = request.body().filter(|b| !b.is_empty()) {
                self.emit(ctx, "┌─ Request Body");
                let text = String::from_utf8_lossy(body);
                self.emit_indented(ctx, &format_body(&text));
            }
        }
    }

    fn log_response(&self, ctx: &CallContext, response: &RawResponse, took_ms: u128) {
        self.emit_banner(ctx, "RESPONSE");
        let message = response.message().unwrap_or_default();
        self.emit(
            ctx,
            &format!(
                "{} {} {message} ({took_ms}ms)",
                status_marker(response.status()),
                response.status()
            ),
        );

        if self.level >= LogLevel::Headers && !response.headers().is_empty() {
            self.emit(ctx, "┌─ Headers");
            for (name, values) in response.headers().iter() {
                self.emit(ctx, &format!("  {name}: {}", values.join(", ")));
            }
        }

        if self.level >= LogLevel::Body && !response.body().is_empty() {
            self.emit(ctx, "┌─ Response Body");
            let formatted = format_body(&response.text());
            let capped: String = formatted.chars().take(MAX_LOGGED_BODY_CHARS).collect();
            self.emit_indented(ctx, &capped);
        }

        self.emit(ctx, &format!("╚{RULE}"));
        self.emit(ctx, "");
    }

    fn emit_banner(&self, ctx: &CallContext, title: &str) {
        self.emit(ctx, &format!("╔{RULE}"));
        self.emit(ctx, &format!("║ {title}"));
        self.emit(ctx, &format!("╠{RULE}"));
    }

    fn emit_indented(&self, ctx: &CallContext, text: &str) {
        for line in text.lines() {
            self.emit(ctx, &format!("  {line}"));
        }
    }
}

impl fmt::Debug for LoggingInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingInterceptor")
            .field("level", &self.level)
            .field("custom_sink", &self.sink.is_some())
            .finish()
    }
}

impl Interceptor for LoggingInterceptor {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn intercept<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, RawResponse> {
        Box::pin(async move {
            if self.level == LogLevel::None {
                return next.run(ctx, request).await;
            }

            self.log_request(ctx, &request);

            let start = Instant::now();
            let response = next.run(ctx, request).await;
            self.log_response(ctx, &response, start.elapsed().as_millis());

            response
        })
    }
}

/// Glyph summarizing a status class.
fn status_marker(status: i32) -> &'static str {
    match status {
        200..=299 => "✓",
        300..=399 => "↪",
        400..=499 => "⚠",
        500..=599 => "✗",
        _ => "?",
    }
}

/// Pretty-prints JSON-looking text; anything else is returned unchanged.
fn format_body(body: &str) -> String {
    let trimmed = body.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return body.to_string();
    }
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| body.to_string())
}
