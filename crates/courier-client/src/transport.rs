//! The terminal stage: one HTTP/1.1 exchange per call.
//!
//! [`HyperTransport`] opens a fresh connection for every hop, runs the TLS
//! handshake and pin check for `https`, sends the request with hyper and
//! buffers the whole response. Nothing is pooled or shared between calls.
//!
//! Every failure is reported as a sentinel [`RawResponse`]. The connection is
//! owned by the call future, so dropping the future (cancellation) closes it.

use bytes::Bytes;
use courier_core::{
    ContentType, RawResponse, Request, ResponseHeaders, TransportFailure, TransportFailureKind,
};
use courier_interceptor::{BoxFuture, CallContext, Terminal};
use courier_telemetry::{fields, record_transport_failure};
use courier_tls::{TlsPolicy, TlsResult};
use flate2::read::GzDecoder;
use http::header::{HeaderName, HeaderValue, ACCEPT_ENCODING, CONTENT_TYPE, HOST};
use http::{HeaderMap, Uri};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper::ext::ReasonPhrase;
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{lookup_host, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};
use url::{Host, Position, Url};

use crate::redirect::{self, DEFAULT_MAX_REDIRECTS};

/// The default terminal stage, built on hyper and tokio-rustls.
///
/// # Example
///
/// ```ignore
/// use courier_client::HyperTransport;
/// use courier_tls::TlsPolicy;
///
/// let transport = HyperTransport::new(TlsPolicy::default())?.with_max_redirects(5);
/// let response = pipeline.process(&ctx, request, &transport).await;
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    policy: TlsPolicy,
    tls_config: Arc<rustls::ClientConfig>,
    max_redirects: u32,
}

impl HyperTransport {
    /// Creates a transport applying `policy` to every `https` connection.
    pub fn new(policy: TlsPolicy) -> TlsResult<Self> {
        let tls_config = policy.client_config()?;
        Ok(Self {
            policy,
            tls_config,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        })
    }

    /// Sets how many redirects a call may follow. `0` disables following,
    /// so the redirect response itself is returned.
    #[must_use]
    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Returns the redirect bound.
    #[must_use]
    pub fn max_redirects(&self) -> u32 {
        self.max_redirects
    }

    /// Returns the TLS policy.
    #[must_use]
    pub fn policy(&self) -> &TlsPolicy {
        &self.policy
    }

    async fn execute(&self, ctx: &CallContext, request: Request) -> Result<RawResponse, TransportFailure> {
        let mut request = request;
        let mut url = parse_url(request.url())?;
        let mut followed = 0;

        loop {
            let response = self.exchange(&request, &url).await?;
            if self.max_redirects == 0 {
                return Ok(response);
            }
            let Some(location) = redirect::location(&response) else {
                return Ok(response);
            };
            if followed == self.max_redirects {
                return Err(TransportFailure::new(
                    TransportFailureKind::TooManyRedirects,
                    format!("too many redirects: exceeded {}", self.max_redirects),
                ));
            }
            followed += 1;

            let next = url.join(&location).map_err(|e| {
                TransportFailure::invalid_url(format!("invalid redirect location '{location}': {e}"))
            })?;
            debug!(
                { fields::CALL_ID } = %ctx.call_id(),
                { fields::HTTP_STATUS } = response.status(),
                from = %url,
                to = %next,
                "Following redirect"
            );
            request = redirect::follow(request, response.status(), &url, &next);
            url = next;
        }
    }

    /// Performs one request/response exchange on a new connection.
    async fn exchange(&self, request: &Request, url: &Url) -> Result<RawResponse, TransportFailure> {
        let secure = match url.scheme() {
            "https" => true,
            "http" => false,
            other => {
                return Err(TransportFailure::invalid_url(format!(
                    "unsupported scheme '{other}'"
                )))
            }
        };
        let host = host_name(url)?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| TransportFailure::invalid_url(format!("no port for {url}")))?;

        let connect_timeout = request.connect_timeout();
        let tcp = timeout(connect_timeout, connect(url, &host, port))
            .await
            .map_err(|_| timed_out("connect", &host, connect_timeout))??;

        if secure {
            let tls = timeout(connect_timeout, self.handshake(&host, tcp))
                .await
                .map_err(|_| timed_out("TLS handshake", &host, connect_timeout))??;
            send(tls, request, url).await
        } else {
            send(tcp, request, url).await
        }
    }

    /// Runs the TLS handshake, then checks the peer chain against the pins.
    async fn handshake(&self, host: &str, tcp: TcpStream) -> Result<TlsStream<TcpStream>, TransportFailure> {
        let server_name = ServerName::try_from(host.to_string()).map_err(|e| {
            TransportFailure::invalid_url(format!("invalid TLS server name '{host}': {e}"))
        })?;

        let stream = TlsConnector::from(self.tls_config.clone())
            .connect(server_name, tcp)
            .await
            .map_err(|e| TransportFailure::tls(format!("TLS handshake with {host} failed: {e}")))?;

        let chain = stream.get_ref().1.peer_certificates().unwrap_or_default();
        if let Err(e) = self.policy.check_pins(host, chain) {
            return Err(TransportFailure::pinning(e.to_string()));
        }

        debug!(host = %host, certificates = chain.len(), "TLS session established");
        Ok(stream)
    }
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("policy", &self.policy)
            .field("max_redirects", &self.max_redirects)
            .finish_non_exhaustive()
    }
}

impl Terminal for HyperTransport {
    fn invoke<'a>(&'a self, ctx: &'a CallContext, request: Request) -> BoxFuture<'a, RawResponse> {
        Box::pin(async move {
            match self.execute(ctx, request).await {
                Ok(response) => response,
                Err(failure) => {
                    warn!(
                        { fields::CALL_ID } = %ctx.call_id(),
                        kind = %failure.kind(),
                        { fields::ERROR } = %failure.message(),
                        "Transport failure"
                    );
                    record_transport_failure(failure.kind().as_str());
                    RawResponse::transport_failure(failure)
                }
            }
        })
    }
}

/// Aborts the connection driver when the exchange ends, however it ends.
struct ConnectionTask(JoinHandle<()>);

impl Drop for ConnectionTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn parse_url(raw: &str) -> Result<Url, TransportFailure> {
    Url::parse(raw).map_err(|e| TransportFailure::invalid_url(format!("invalid URL '{raw}': {e}")))
}

/// Returns the host as used for TLS names and pin lookup.
fn host_name(url: &Url) -> Result<String, TransportFailure> {
    match url.host() {
        Some(Host::Domain(domain)) => Ok(domain.to_string()),
        Some(Host::Ipv4(ip)) => Ok(ip.to_string()),
        Some(Host::Ipv6(ip)) => Ok(ip.to_string()),
        None => Err(TransportFailure::invalid_url(format!("no host in {url}"))),
    }
}

fn timed_out(phase: &str, host: &str, after: Duration) -> TransportFailure {
    TransportFailure::timeout(format!("{phase} to {host} timed out after {after:?}"))
}

/// Resolves the host and connects to the first address that accepts.
async fn connect(url: &Url, host: &str, port: u16) -> Result<TcpStream, TransportFailure> {
    let addrs: Vec<SocketAddr> = match url.host() {
        Some(Host::Ipv4(ip)) => vec![SocketAddr::from((ip, port))],
        Some(Host::Ipv6(ip)) => vec![SocketAddr::from((ip, port))],
        _ => lookup_host((host, port))
            .await
            .map_err(|e| TransportFailure::dns(format!("failed to resolve {host}: {e}")))?
            .collect(),
    };
    if addrs.is_empty() {
        return Err(TransportFailure::dns(format!("no addresses for {host}")));
    }

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                let _ = stream.set_nodelay(true);
                debug!(host = %host, addr = %addr, "Connected");
                return Ok(stream);
            }
            Err(e) => {
                debug!(addr = %addr, error = %e, "Connect attempt failed");
                last_error = Some(e);
            }
        }
    }

    let reason = last_error.map_or_else(|| "no usable address".to_string(), |e| e.to_string());
    Err(TransportFailure::connect(format!(
        "failed to connect to {host}:{port}: {reason}"
    )))
}

/// Sends `request` over `io` and buffers the response.
async fn send<I>(io: I, request: &Request, url: &Url) -> Result<RawResponse, TransportFailure>
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, connection) = http1::handshake(TokioIo::new(io))
        .await
        .map_err(hyper_failure)?;
    let _connection = ConnectionTask(tokio::spawn(async move {
        if let Err(e) = connection.await {
            debug!(error = %e, "Connection closed with error");
        }
    }));

    let read_timeout = request.read_timeout();
    let host = url.host_str().unwrap_or_default();

    let response = timeout(read_timeout, sender.send_request(build_request(request, url)?))
        .await
        .map_err(|_| timed_out("read", host, read_timeout))?
        .map_err(hyper_failure)?;

    let (parts, body) = response.into_parts();
    let body = timeout(read_timeout, body.collect())
        .await
        .map_err(|_| timed_out("read", host, read_timeout))?
        .map_err(hyper_failure)?
        .to_bytes();

    let headers = response_headers(&parts.headers);
    let body = if headers.is_gzip() && !body.is_empty() {
        gunzip(&body)?
    } else {
        body
    };

    let message = parts
        .extensions
        .get::<ReasonPhrase>()
        .map(|reason| String::from_utf8_lossy(reason.as_bytes()).into_owned())
        .or_else(|| parts.status.canonical_reason().map(str::to_string));

    Ok(RawResponse::new(
        i32::from(parts.status.as_u16()),
        message,
        headers,
        body,
    ))
}

/// Builds the wire request: origin-form target, `Host`, `Accept-Encoding`,
/// the request headers and, when allowed, the body with its content type.
fn build_request(request: &Request, url: &Url) -> Result<http::Request<Full<Bytes>>, TransportFailure> {
    let body = if request.has_sendable_body() {
        request.body().cloned().unwrap_or_default()
    } else {
        Bytes::new()
    };

    let mut http_request = http::Request::new(Full::new(body));
    *http_request.method_mut() = request.method().into();
    *http_request.uri_mut() = url[Position::BeforePath..Position::AfterQuery]
        .parse::<Uri>()
        .map_err(|e| TransportFailure::invalid_url(format!("invalid request target: {e}")))?;

    let headers = http_request.headers_mut();
    headers.insert(HOST, header_value(&url[Position::BeforeHost..Position::BeforePath])?);
    if request.header_ignore_case(ACCEPT_ENCODING.as_str()).is_none() {
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
    }

    for (name, value) in request.headers() {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            TransportFailure::protocol(format!("invalid header name '{name}': {e}"))
        })?;
        headers.insert(name, header_value(value)?);
    }

    if request.has_sendable_body() {
        headers.insert(CONTENT_TYPE, header_value(&content_type(request))?);
    }
    Ok(http_request)
}

/// The body content type: an explicit header, else the declared type, else
/// JSON. A UTF-8 charset is appended unless one is already given.
fn content_type(request: &Request) -> String {
    let declared = request
        .header_ignore_case(CONTENT_TYPE.as_str())
        .map(str::to_string)
        .or_else(|| request.content_type().map(|ct| ct.as_str().to_string()))
        .unwrap_or_else(|| ContentType::Json.as_str().to_string());

    if declared.to_ascii_lowercase().contains("charset=") {
        declared
    } else {
        format!("{declared}; charset=UTF-8")
    }
}

fn header_value(value: &str) -> Result<HeaderValue, TransportFailure> {
    HeaderValue::from_str(value)
        .map_err(|e| TransportFailure::protocol(format!("invalid header value '{value}': {e}")))
}

fn response_headers(headers: &HeaderMap) -> ResponseHeaders {
    let mut out = ResponseHeaders::default();
    for (name, value) in headers {
        out.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
    }
    out
}

fn gunzip(body: &[u8]) -> Result<Bytes, TransportFailure> {
    let mut decoded = Vec::new();
    GzDecoder::new(body)
        .read_to_end(&mut decoded)
        .map_err(|e| TransportFailure::io(format!("failed to decompress gzip body: {e}")))?;
    debug!(compressed = body.len(), decompressed = decoded.len(), "Decompressed gzip body");
    Ok(Bytes::from(decoded))
}

fn hyper_failure(e: hyper::Error) -> TransportFailure {
    if e.is_timeout() {
        TransportFailure::timeout(e.to_string())
    } else if e.is_parse() || e.is_parse_status() || e.is_parse_too_large() {
        TransportFailure::protocol(e.to_string())
    } else {
        TransportFailure::io(e.to_string())
    }
}
