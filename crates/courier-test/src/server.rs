//! In-process HTTP(S) servers for transport tests.

use bytes::Bytes;
use http::{HeaderMap, Method, Request, Response, Uri};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;
use tracing::debug;

use crate::certs::SelfSignedCert;
use crate::error::TestError;
use crate::response::MockResponse;

/// A request as received by a [`MockServer`].
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    /// Request method.
    pub method: Method,
    /// Request target, in origin form.
    pub uri: Uri,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

impl ReceivedRequest {
    /// Returns the first value of a header as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the request path without the query.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the body as text.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Default)]
struct ServerState {
    routes: Mutex<HashMap<String, MockResponse>>,
    received: Mutex<Vec<ReceivedRequest>>,
    connections: AtomicUsize,
}

impl ServerState {
    /// Finds the route for `uri`: path and query first, then the bare path.
    fn route(&self, uri: &Uri) -> Option<MockResponse> {
        let routes = self.routes.lock();
        uri.path_and_query()
            .and_then(|pq| routes.get(pq.as_str()))
            .or_else(|| routes.get(uri.path()))
            .cloned()
    }
}

/// A scripted HTTP/1.1 server on `127.0.0.1`.
///
/// Each path serves its registered [`MockResponse`]; anything else gets a
/// `404`. Every request is recorded. The server stops when dropped.
///
/// # Example
///
/// ```ignore
/// use courier_test::{MockResponse, MockServer};
///
/// let server = MockServer::start().await?;
/// server.mock("/v1/forecast", MockResponse::json(200, r#"{"latitude":38.64}"#));
///
/// let url = server.url("/v1/forecast?latitude=38.64");
/// // ... drive a client against `url` ...
///
/// assert_eq!(server.received()[0].path(), "/v1/forecast");
/// ```
pub struct MockServer {
    addr: SocketAddr,
    tls: bool,
    state: Arc<ServerState>,
    task: JoinHandle<()>,
}

impl MockServer {
    /// Starts a plain HTTP server on an ephemeral port.
    pub async fn start() -> Result<Self, TestError> {
        Self::bind(None).await
    }

    /// Starts an HTTPS server presenting `cert`.
    ///
    /// URLs from [`MockServer::url`] then use `https://localhost`.
    pub async fn start_tls(cert: &SelfSignedCert) -> Result<Self, TestError> {
        let acceptor = TlsAcceptor::from(cert.server_config()?);
        Self::bind(Some(acceptor)).await
    }

    async fn bind(acceptor: Option<TlsAcceptor>) -> Result<Self, TestError> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(ServerState::default());
        let tls = acceptor.is_some();

        let accept_state = state.clone();
        let task = tokio::spawn(async move {
            loop {
                let (stream, peer_addr) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        debug!("Failed to accept connection: {}", e);
                        continue;
                    }
                };
                accept_state.connections.fetch_add(1, Ordering::SeqCst);

                let state = accept_state.clone();
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    match acceptor {
                        Some(acceptor) => match acceptor.accept(stream).await {
                            Ok(stream) => serve(stream, state).await,
                            Err(e) => debug!(peer = %peer_addr, "TLS accept failed: {}", e),
                        },
                        None => serve(stream, state).await,
                    }
                });
            }
        });

        Ok(Self {
            addr,
            tls,
            state,
            task,
        })
    }

    /// Registers the response for `path`.
    ///
    /// `path` may include a query string, in which case it only matches
    /// that exact target. Registering a path again replaces its response.
    pub fn mock(&self, path: impl Into<String>, response: MockResponse) -> &Self {
        self.state.routes.lock().insert(path.into(), response);
        self
    }

    /// Returns an absolute URL for `path` on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Returns the server's origin, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.tls {
            format!("https://localhost:{}", self.addr.port())
        } else {
            format!("http://{}", self.addr)
        }
    }

    /// Returns the bound address.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns every request received so far, in arrival order.
    #[must_use]
    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.state.received.lock().clone()
    }

    /// Returns how many connections were accepted.
    #[must_use]
    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for MockServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockServer")
            .field("addr", &self.addr)
            .field("tls", &self.tls)
            .finish_non_exhaustive()
    }
}

async fn serve<I>(io: I, state: Arc<ServerState>)
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let service = service_fn(move |req| {
        let state = state.clone();
        async move { handle_request(req, state).await }
    });

    if let Err(e) = http1::Builder::new()
        .serve_connection(TokioIo::new(io), service)
        .await
    {
        debug!("Connection error: {}", e);
    }
}

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<ServerState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            debug!("Failed to read request body: {}", e);
            Bytes::new()
        }
    };

    let route = state.route(&parts.uri);
    state.received.lock().push(ReceivedRequest {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
    });

    let Some(mock) = route else {
        return Ok(MockResponse::text(404, "no mock registered").to_http());
    };
    if let Some(delay) = mock.delay_duration() {
        tokio::time::sleep(delay).await;
    }
    Ok(mock.to_http())
}

/// A server that accepts connections and never answers.
///
/// It drains whatever the client sends and counts connections as they are
/// closed by the peer, so tests can observe timeouts and connection release.
pub struct StallingServer {
    addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl StallingServer {
    /// Starts the server on an ephemeral port.
    pub async fn start() -> Result<Self, TestError> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let accepted = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));

        let (accept_count, close_count) = (accepted.clone(), closed.clone());
        let task = tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                accept_count.fetch_add(1, Ordering::SeqCst);
                let close_count = close_count.clone();
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    loop {
                        match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(_) => {}
                        }
                    }
                    close_count.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        Ok(Self {
            addr,
            accepted,
            closed,
            task,
        })
    }

    /// Returns an absolute URL for `path` on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Returns how many connections were accepted.
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Returns how many connections the peer has closed.
    #[must_use]
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Waits until at least `count` connections were closed by the peer.
    ///
    /// Returns false if that does not happen within `within`.
    pub async fn wait_closed(&self, count: usize, within: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + within;
        while self.closed() < count {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        true
    }
}

impl Drop for StallingServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
