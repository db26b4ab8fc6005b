//! Connection failures, deadlines, cancellation and configuration-driven
//! clients against live sockets.

use std::time::Duration;

use courier_client::{HttpClient, HttpClientBuilder};
use courier_config::ConfigLoader;
use courier_core::{CallError, HttpResponse, Text, TransportFailureKind};
use courier_test::{MockResponse, MockServer, StallingServer};

fn kind<T>(response: &HttpResponse<T>) -> Option<TransportFailureKind> {
    match response {
        HttpResponse::Error(CallError::Transport(failure)) => Some(failure.kind()),
        _ => None,
    }
}

#[tokio::test]
async fn test_connection_refused_is_connect_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let client = HttpClient::builder().build().unwrap();
    let response = client.get_text(&format!("http://{addr}/")).await;

    assert_eq!(kind(&response), Some(TransportFailureKind::Connect));
    assert!(response.is_network_error());
    assert!(!response.is_timeout());
}

#[tokio::test]
async fn test_unsupported_scheme_is_not_a_network_error() {
    let client = HttpClient::builder().build().unwrap();
    let response = client.get_text("ftp://example.com/file").await;

    assert_eq!(kind(&response), Some(TransportFailureKind::InvalidUrl));
    assert!(!response.is_network_error());
}

#[tokio::test]
async fn test_read_timeout_releases_connection() {
    let server = StallingServer::start().await.unwrap();
    let client = HttpClient::builder()
        .read_timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let response = client.get_text(&server.url("/slow")).await;

    assert!(response.is_timeout(), "{response:?}");
    assert_eq!(kind(&response), Some(TransportFailureKind::Timeout));
    assert_eq!(server.accepted(), 1);
    assert!(server.wait_closed(1, Duration::from_secs(2)).await);
}

#[tokio::test]
async fn test_per_request_timeout_overrides_client_default() {
    let server = StallingServer::start().await.unwrap();
    let client = HttpClient::builder()
        .read_timeout(Duration::from_secs(30))
        .build()
        .unwrap();

    let request = client
        .request(server.url("/slow"))
        .read_timeout(Duration::from_millis(150))
        .build()
        .unwrap();
    let response = tokio::time::timeout(Duration::from_secs(5), client.execute(request, &Text))
        .await
        .expect("per-request deadline should fire first");

    assert!(response.is_timeout());
}

#[tokio::test]
async fn test_cancellation_closes_connection() {
    let server = StallingServer::start().await.unwrap();
    let client = HttpClient::builder()
        .read_timeout(Duration::from_secs(30))
        .build()
        .unwrap();

    let request = client.request(server.url("/stuck")).build().unwrap();
    let response = client
        .execute_until(request, &Text, tokio::time::sleep(Duration::from_millis(150)))
        .await;

    let HttpResponse::Error(error) = &response else {
        panic!("expected cancellation, got {response:?}");
    };
    assert!(error.is_cancelled());
    assert!(!error.is_network_error());
    assert!(server.wait_closed(1, Duration::from_secs(2)).await);
}

#[tokio::test]
async fn test_dropping_call_future_closes_connection() {
    let server = StallingServer::start().await.unwrap();
    let client = HttpClient::builder()
        .read_timeout(Duration::from_secs(30))
        .build()
        .unwrap();

    let abandoned =
        tokio::time::timeout(Duration::from_millis(150), client.get_text(&server.url("/stuck"))).await;

    assert!(abandoned.is_err());
    assert!(server.wait_closed(1, Duration::from_secs(2)).await);
}

#[tokio::test]
async fn test_cancel_after_completion_keeps_response() {
    let server = MockServer::start().await.unwrap();
    server.mock("/fast", MockResponse::text(200, "done"));
    let client = HttpClient::builder().build().unwrap();

    let request = client.request(server.url("/fast")).build().unwrap();
    let response = client
        .execute_until(request, &Text, tokio::time::sleep(Duration::from_secs(10)))
        .await;

    assert_eq!(response.ok().as_deref(), Some("done"));
}

#[tokio::test]
async fn test_client_from_config() {
    let server = MockServer::start().await.unwrap();
    server.mock("/v1/status", MockResponse::json(200, r#"{"up":true}"#));

    let toml = format!(
        r#"
[client]
base_url = "{}/v1/"
user_agent = "status-probe/2"

[headers]
"X-Api-Key" = "secret"

[logging]
enabled = true
level = "headers"
"#,
        server.base_url()
    );
    let config = ConfigLoader::new()
        .with_string(&toml, "toml")
        .unwrap()
        .load()
        .unwrap();

    let client = HttpClientBuilder::from_config(&config).build().unwrap();
    assert_eq!(client.pipeline().stage_names(), vec!["logging"]);

    let response = client.get_text("status").await;
    assert!(response.is_success(), "{response:?}");

    let received = &server.received()[0];
    assert_eq!(received.path(), "/v1/status");
    assert_eq!(received.header("x-api-key"), Some("secret"));
    assert_eq!(received.header("user-agent"), Some("status-probe/2"));
}

#[derive(Clone, Default)]
struct Capture(std::sync::Arc<parking_lot::Mutex<Vec<u8>>>);

impl std::io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test(flavor = "current_thread")]
async fn test_call_events_use_standard_field_names() {
    use courier_telemetry::fields;

    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = HttpClient::builder().build().unwrap();
    let response = client.get_text(&format!("http://{addr}/")).await;
    assert!(response.is_network_error());

    let output = String::from_utf8(capture.0.lock().clone()).unwrap();
    assert!(output.contains("Transport failure"), "{output}");
    assert!(output.contains("Call completed"), "{output}");
    for field in [fields::CALL_ID, fields::ERROR, fields::HTTP_METHOD, fields::OUTCOME, fields::DURATION_MS] {
        assert!(output.contains(&format!("\"{field}\":")), "missing {field} in {output}");
    }
    assert!(output.contains(&format!("\"{}\":\"error\"", fields::OUTCOME)));
}
