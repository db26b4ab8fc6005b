//! The client façade.
//!
//! [`HttpClient`] owns the base URL, default headers, interceptor pipeline
//! and transport. Each call resolves the request against those defaults,
//! runs it through the pipeline into the transport, and decodes the result.
//! The client is cheap to clone and safe to share across tasks; calls never
//! share connections or mutable state.

use courier_config::ClientConfig;
use courier_core::{
    decode_response, BodyDecoder, CallError, Headers, HttpResponse, Json, Method, Request,
    RequestBuilder, RequestError, Text, TransportFailure, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT,
};
use courier_interceptor::{
    BoxedInterceptor, CallContext, Interceptor, LogLevel, LoggingInterceptor, Pipeline,
    PipelineBuilder,
};
use courier_telemetry::{fields, record_call, InFlightGuard};
use courier_tls::TlsPolicy;
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::redirect::DEFAULT_MAX_REDIRECTS;
use crate::transport::HyperTransport;

/// Default `User-Agent` value.
pub const DEFAULT_USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"));

/// An HTTP client with an interceptor pipeline.
///
/// # Example
///
/// ```ignore
/// use courier_client::HttpClient;
/// use courier_core::Json;
///
/// let client = HttpClient::builder()
///     .base_url("https://api.open-meteo.com/")
///     .default_header("accept-encoding", "gzip")
///     .build()?;
///
/// let forecast = client
///     .get("v1/forecast", &Json::<Forecast>::new(), |r| {
///         r.query_param("latitude", 38.64).query_param("longitude", 34.73)
///     })
///     .await;
/// ```
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base_url: Option<Url>,
    default_headers: Headers,
    user_agent: String,
    connect_timeout: Duration,
    read_timeout: Duration,
    pipeline: Pipeline,
    transport: HyperTransport,
}

impl HttpClient {
    /// Creates a new client builder.
    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Returns the base URL, if one is configured.
    #[must_use]
    pub fn base_url(&self) -> Option<&Url> {
        self.inner.base_url.as_ref()
    }

    /// Returns the default headers.
    #[must_use]
    pub fn default_headers(&self) -> &Headers {
        &self.inner.default_headers
    }

    /// Returns the interceptor pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.inner.pipeline
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &HyperTransport {
        &self.inner.transport
    }

    /// Starts a request for `url` carrying this client's timeouts.
    #[must_use]
    pub fn request(&self, url: impl Into<String>) -> RequestBuilder {
        Request::builder(url)
            .connect_timeout(self.inner.connect_timeout)
            .read_timeout(self.inner.read_timeout)
    }

    /// Executes `request` and decodes the response with `decoder`.
    ///
    /// Network failures, non-2xx statuses and decode failures all come back
    /// as an [`HttpResponse`] variant; this never fails otherwise. Dropping
    /// the returned future cancels the call and closes its connection.
    pub async fn execute<D: BodyDecoder>(&self, request: Request, decoder: &D) -> HttpResponse<D::Output> {
        let ctx = CallContext::new();
        let _in_flight = InFlightGuard::new();
        let method = request.method();

        let response = match self.resolve(request) {
            Ok(request) => {
                let raw = self
                    .inner
                    .pipeline
                    .process(&ctx, request, &self.inner.transport)
                    .await;
                decode_response(raw, decoder)
            }
            Err(failure) => HttpResponse::Error(CallError::Transport(failure)),
        };

        let outcome = outcome_label(&response);
        debug!(
            { fields::CALL_ID } = %ctx.call_id(),
            { fields::HTTP_METHOD } = method.as_str(),
            { fields::HTTP_STATUS } = response.status_code(),
            { fields::OUTCOME } = outcome,
            { fields::DURATION_MS } = ctx.elapsed().as_millis() as u64,
            "Call completed"
        );
        record_call(method.as_str(), outcome, ctx.elapsed());
        response
    }

    /// Executes `request` unless `cancel` completes first.
    ///
    /// On cancellation the in-flight exchange is dropped, its connection
    /// closed, and the result is [`CallError::Cancelled`].
    pub async fn execute_until<D, C>(&self, request: Request, decoder: &D, cancel: C) -> HttpResponse<D::Output>
    where
        D: BodyDecoder,
        C: Future<Output = ()>,
    {
        let method = request.method();
        let started = Instant::now();
        tokio::select! {
            biased;
            () = cancel => {
                debug!({ fields::HTTP_METHOD } = method.as_str(), "Call cancelled");
                record_call(method.as_str(), "error", started.elapsed());
                HttpResponse::Error(CallError::Cancelled)
            }
            response = self.execute(request, decoder) => response,
        }
    }

    /// Sends a `GET`; `customize` adjusts the request before it is built.
    ///
    /// The verb always sets the method, whatever `customize` chose.
    ///
    /// # Panics
    ///
    /// Panics if `url` is empty. The verbs share this check.
    pub async fn get<D, F>(&self, url: &str, decoder: &D, customize: F) -> HttpResponse<D::Output>
    where
        D: BodyDecoder,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        self.send(Method::Get, url, decoder, customize).await
    }

    /// Sends a `POST`.
    pub async fn post<D, F>(&self, url: &str, decoder: &D, customize: F) -> HttpResponse<D::Output>
    where
        D: BodyDecoder,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        self.send(Method::Post, url, decoder, customize).await
    }

    /// Sends a `PUT`.
    pub async fn put<D, F>(&self, url: &str, decoder: &D, customize: F) -> HttpResponse<D::Output>
    where
        D: BodyDecoder,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        self.send(Method::Put, url, decoder, customize).await
    }

    /// Sends a `DELETE`.
    pub async fn delete<D, F>(&self, url: &str, decoder: &D, customize: F) -> HttpResponse<D::Output>
    where
        D: BodyDecoder,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        self.send(Method::Delete, url, decoder, customize).await
    }

    /// `GET` decoding a JSON body into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> HttpResponse<T> {
        self.get(url, &Json::<T>::new(), |r| r).await
    }

    /// `GET` returning the body text.
    pub async fn get_text(&self, url: &str) -> HttpResponse<String> {
        self.get(url, &Text, |r| r).await
    }

    async fn send<D, F>(&self, method: Method, url: &str, decoder: &D, customize: F) -> HttpResponse<D::Output>
    where
        D: BodyDecoder,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        match customize(self.request(url)).method(method).build() {
            Ok(request) => self.execute(request, decoder).await,
            Err(RequestError::EmptyUrl) => panic!("request URL cannot be empty"),
            Err(RequestError::Json(e)) => HttpResponse::Error(CallError::Transport(
                TransportFailure::protocol(format!("failed to serialize request body: {e}")),
            )),
        }
    }

    /// Applies the base URL, default headers and `User-Agent`.
    fn resolve(&self, request: Request) -> Result<Request, TransportFailure> {
        let url = match &self.inner.base_url {
            Some(base) if !has_scheme(request.url()) => base
                .join(request.url())
                .map_err(|e| {
                    TransportFailure::invalid_url(format!(
                        "cannot resolve '{}' against '{base}': {e}",
                        request.url()
                    ))
                })?
                .to_string(),
            _ => request.url().to_string(),
        };

        let mut headers: Headers = self
            .inner
            .default_headers
            .iter()
            .filter(|(name, _)| request.header_ignore_case(name).is_none())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        headers.extend(request.headers().iter().map(|(k, v)| (k.clone(), v.clone())));

        let has_user_agent = headers.keys().any(|k| k.eq_ignore_ascii_case("User-Agent"));
        if !has_user_agent && !self.inner.user_agent.is_empty() {
            headers.insert("User-Agent".to_string(), self.inner.user_agent.clone());
        }

        Ok(request.with_url(url).with_headers(headers))
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.inner.base_url.as_ref().map(Url::as_str))
            .field("default_headers", &self.inner.default_headers.keys().collect::<Vec<_>>())
            .field("pipeline", &self.inner.pipeline)
            .field("transport", &self.inner.transport)
            .finish()
    }
}

/// True if `url` starts with a scheme (`ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"`).
/// Such URLs bypass the base URL.
fn has_scheme(url: &str) -> bool {
    let Some((scheme, _)) = url.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn outcome_label<T>(response: &HttpResponse<T>) -> &'static str {
    match response {
        HttpResponse::Success(_) => "success",
        HttpResponse::Failure(_) => "failure",
        HttpResponse::Error(_) => "error",
    }
}

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    base_url: String,
    default_headers: Headers,
    pipeline: PipelineBuilder,
    logging: Option<LoggingInterceptor>,
    tls_policy: TlsPolicy,
    max_redirects: u32,
    user_agent: String,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            default_headers: Headers::new(),
            pipeline: Pipeline::builder(),
            logging: None,
            tls_policy: TlsPolicy::default(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl HttpClientBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a builder from loaded configuration.
    ///
    /// Later builder calls override what the configuration set.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut tls = TlsPolicy::builder().danger_accept_invalid_certs(config.tls.accept_invalid_certs);
        if let Some(pinner) = config.certificate_pinner() {
            tls = tls.certificate_pinner(pinner);
        }

        let mut builder = Self::new()
            .base_url(config.client.base_url.clone())
            .default_headers(config.headers.clone())
            .max_redirects(config.client.max_redirects)
            .user_agent(config.client.user_agent.clone())
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            .tls_policy(tls.build());

        if config.logging.enabled {
            builder = builder.logging(config.logging.level);
        }
        builder
    }

    /// Sets the base URL that relative request URLs resolve against.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Adds a header sent with every request unless the request sets it.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Adds several default headers.
    #[must_use]
    pub fn default_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.default_headers.insert(name.into(), value.into());
        }
        self
    }

    /// Appends an interceptor. Interceptors run in registration order.
    ///
    /// A logging stage set through [`logging`](Self::logging) or
    /// [`logging_interceptor`](Self::logging_interceptor) is the exception:
    /// it always runs last, after every interceptor registered here.
    #[must_use]
    pub fn interceptor<I: Interceptor>(mut self, interceptor: I) -> Self {
        self.pipeline = self.pipeline.add(interceptor);
        self
    }

    /// Appends an already shared interceptor.
    #[must_use]
    pub fn interceptor_boxed(mut self, interceptor: BoxedInterceptor) -> Self {
        self.pipeline = self.pipeline.add_boxed(interceptor);
        self
    }

    /// Logs every exchange at `level`.
    ///
    /// The logging stage runs after every registered interceptor, so it
    /// shows the request exactly as sent. `LogLevel::None` removes it.
    #[must_use]
    pub fn logging(mut self, level: LogLevel) -> Self {
        self.logging = (level != LogLevel::None).then(|| LoggingInterceptor::new(level));
        self
    }

    /// Uses a custom logging interceptor, for example one with a sink.
    #[must_use]
    pub fn logging_interceptor(mut self, interceptor: LoggingInterceptor) -> Self {
        self.logging = Some(interceptor);
        self
    }

    /// Sets the TLS policy.
    #[must_use]
    pub fn tls_policy(mut self, policy: TlsPolicy) -> Self {
        self.tls_policy = policy;
        self
    }

    /// Sets the redirect bound. `0` disables following.
    #[must_use]
    pub fn max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Sets the `User-Agent` added to requests that do not carry one.
    /// An empty value disables it.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the connect timeout for requests started with [`HttpClient::request`].
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the read timeout for requests started with [`HttpClient::request`].
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Fails if the base URL is set but not absolute, or the TLS policy
    /// cannot be turned into a rustls configuration.
    pub fn build(self) -> ClientResult<HttpClient> {
        let base_url = if self.base_url.is_empty() {
            None
        } else {
            let url = Url::parse(&self.base_url)
                .map_err(|e| ClientError::invalid_base_url(&self.base_url, e.to_string()))?;
            if url.cannot_be_a_base() {
                return Err(ClientError::invalid_base_url(&self.base_url, "cannot be a base"));
            }
            Some(url)
        };

        let transport = HyperTransport::new(self.tls_policy)?.with_max_redirects(self.max_redirects);
        let pipeline = match self.logging {
            Some(logging) => self.pipeline.add(logging),
            None => self.pipeline,
        }
        .build();

        Ok(HttpClient {
            inner: Arc::new(ClientInner {
                base_url,
                default_headers: self.default_headers,
                user_agent: self.user_agent,
                connect_timeout: self.connect_timeout,
                read_timeout: self.read_timeout,
                pipeline,
                transport,
            }),
        })
    }
}

impl fmt::Debug for HttpClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClientBuilder")
            .field("base_url", &self.base_url)
            .field("max_redirects", &self.max_redirects)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}
