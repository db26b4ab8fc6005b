//! End-to-end client tests against an in-process HTTP server.
//!
//! Every call goes through the real transport: base URL resolution, header
//! merge, interceptors, hyper, gzip and redirects, then decoding.

use courier_client::{HttpClient, DEFAULT_USER_AGENT};
use courier_core::{CallError, HttpResponse, Json, Method, Text, TransportFailureKind};
use courier_interceptor::{AuthInterceptor, FnInterceptor, LogLevel, LoggingInterceptor};
use courier_test::{MockResponse, MockServer};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize, PartialEq)]
struct Forecast {
    latitude: f64,
    longitude: f64,
}

async fn server() -> MockServer {
    MockServer::start().await.unwrap()
}

fn client_for(server: &MockServer) -> HttpClient {
    HttpClient::builder()
        .base_url(format!("{}/", server.base_url()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_forecast_scenario() {
    let server = server().await;
    server.mock(
        "/v1/forecast",
        MockResponse::json(200, r#"{"latitude":38.64,"longitude":34.73}"#),
    );

    let client = HttpClient::builder()
        .base_url(format!("{}/", server.base_url()))
        .default_header("accept-encoding", "gzip")
        .build()
        .unwrap();

    let response = client
        .get("/v1/forecast", &Json::<Forecast>::new(), |r| {
            r.query_param("latitude", 38.64).query_param("longitude", 34.73)
        })
        .await;

    let HttpResponse::Success(success) = response else {
        panic!("expected success, got {response:?}");
    };
    assert_eq!(success.status_code, 200);
    assert_eq!(
        success.body,
        Forecast {
            latitude: 38.64,
            longitude: 34.73
        }
    );

    let received = server.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].method, http::Method::GET);
    assert_eq!(
        received[0].uri.to_string(),
        "/v1/forecast?latitude=38.64&longitude=34.73"
    );
}

#[tokio::test]
async fn test_request_headers_win_over_defaults() {
    let server = server().await;
    server.mock("/echo", MockResponse::text(200, "ok"));

    let client = HttpClient::builder()
        .base_url(server.base_url())
        .default_header("X-Client", "default")
        .default_header("X-Only-Default", "kept")
        .default_header("accept-encoding", "gzip")
        .build()
        .unwrap();

    let response = client
        .get("/echo", &Text, |r| {
            r.header("X-Client", "per-request")
                .header("Accept-Encoding", "identity")
        })
        .await;
    assert!(response.is_success());

    let received = &server.received()[0];
    assert_eq!(received.header("x-client"), Some("per-request"));
    assert_eq!(received.headers.get_all("x-client").iter().count(), 1);
    assert_eq!(received.header("x-only-default"), Some("kept"));
    assert_eq!(received.header("accept-encoding"), Some("identity"));
}

#[tokio::test]
async fn test_default_user_agent_and_accept_encoding() {
    let server = server().await;
    server.mock("/ua", MockResponse::text(200, "ok"));
    let client = client_for(&server);

    let _ = client.get_text("/ua").await;
    let _ = client
        .get("/ua", &Text, |r| r.header("user-agent", "custom/1.0"))
        .await;

    let received = server.received();
    assert_eq!(received[0].header("user-agent"), Some(DEFAULT_USER_AGENT));
    assert_eq!(received[0].header("accept-encoding"), Some("gzip"));
    assert_eq!(received[1].header("user-agent"), Some("custom/1.0"));
}

#[tokio::test]
async fn test_absolute_url_bypasses_base() {
    let base = server().await;
    let other = server().await;
    other.mock("/direct", MockResponse::text(200, "direct"));

    let client = client_for(&base);
    let response = client.get_text(&other.url("/direct")).await;

    assert_eq!(response.ok().as_deref(), Some("direct"));
    assert!(base.received().is_empty());
}

#[tokio::test]
async fn test_gzip_body_is_transparent() {
    let server = server().await;
    server.mock(
        "/gz",
        MockResponse::json(200, r#"{"latitude":1.5,"longitude":2.5}"#).gzip(),
    );

    let response = client_for(&server).get_json::<Forecast>("/gz").await;
    let HttpResponse::Success(success) = response else {
        panic!("expected success, got {response:?}");
    };
    assert_eq!(success.raw_body, r#"{"latitude":1.5,"longitude":2.5}"#);
    assert!(success.headers.is_gzip());
}

#[tokio::test]
async fn test_non_2xx_is_failure_with_body() {
    let server = server().await;
    server
        .mock("/missing", MockResponse::json(404, r#"{"error":"nope"}"#))
        .mock("/broken", MockResponse::text(503, "down"));
    let client = client_for(&server);

    let HttpResponse::Failure(not_found) = client.get_text("/missing").await else {
        panic!("expected failure");
    };
    assert_eq!(not_found.status_code, 404);
    assert!(not_found.is_client_error());
    assert_eq!(not_found.message, "Not Found");
    assert_eq!(not_found.error_body.as_deref(), Some(r#"{"error":"nope"}"#));

    let broken = client.get_text("/broken").await;
    assert!(broken.is_server_error());
    assert_eq!(broken.status_code(), Some(503));
}

#[tokio::test]
async fn test_json_decode_errors() {
    let server = server().await;
    server
        .mock("/html", MockResponse::text(200, "<html></html>"))
        .mock("/bad", MockResponse::json(200, "{not json"));
    let client = client_for(&server);

    let unsupported = client.get_json::<Forecast>("/html").await;
    assert!(matches!(unsupported, HttpResponse::Error(ref e) if e.is_decode_error()));

    let malformed = client.get_json::<Forecast>("/bad").await;
    assert!(matches!(malformed, HttpResponse::Error(ref e) if e.is_decode_error()));
    assert!(!malformed.is_network_error());
}

#[tokio::test]
async fn test_charset_from_content_type() {
    let server = server().await;
    server.mock(
        "/latin1",
        MockResponse::new(200)
            .header("Content-Type", "text/plain; charset=ISO-8859-1")
            .body(vec![0x43, 0xe9, 0x73, 0x61, 0x72]),
    );

    let response = client_for(&server).get_text("/latin1").await;
    assert_eq!(response.ok().as_deref(), Some("César"));
}

#[tokio::test]
async fn test_post_sends_body_with_charset() {
    let server = server().await;
    server.mock("/items", MockResponse::json(201, r#"{"id":7}"#));

    let response = client_for(&server)
        .post("/items", &Json::<serde_json::Value>::new(), |r| {
            r.json_value(&serde_json::json!({"name": "courier"}))
        })
        .await;
    assert_eq!(response.status_code(), Some(201));

    let received = &server.received()[0];
    assert_eq!(received.method, http::Method::POST);
    assert_eq!(
        received.header("content-type"),
        Some("application/json; charset=UTF-8")
    );
    assert_eq!(received.body_text(), r#"{"name":"courier"}"#);
}

#[tokio::test]
async fn test_form_and_delete_verbs() {
    let server = server().await;
    server
        .mock("/form", MockResponse::text(200, "ok"))
        .mock("/items/7", MockResponse::new(204));
    let client = client_for(&server);

    let _ = client
        .put("/form", &Text, |r| r.form_body([("q", "a,b"), ("n", "1 2")]))
        .await;
    let deleted = client.delete("/items/7", &Text, |r| r).await;
    assert_eq!(deleted.status_code(), Some(204));

    let received = server.received();
    assert_eq!(received[0].method, http::Method::PUT);
    assert_eq!(
        received[0].header("content-type"),
        Some("application/x-www-form-urlencoded; charset=UTF-8")
    );
    assert_eq!(received[0].body_text(), "q=a%2Cb&n=1+2");
    assert_eq!(received[1].method, http::Method::DELETE);
    assert!(received[1].body.is_empty());
}

#[tokio::test]
async fn test_each_call_uses_its_own_connection() {
    let server = server().await;
    server.mock("/ping", MockResponse::text(200, "pong"));
    let client = client_for(&server);

    for _ in 0..3 {
        assert!(client.get_text("/ping").await.is_success());
    }
    assert_eq!(server.connections(), 3);
}

#[tokio::test]
async fn test_same_request_twice_is_equivalent() {
    let server = server().await;
    server.mock("/stable", MockResponse::json(200, r#"{"latitude":1.0,"longitude":2.0}"#));
    let client = client_for(&server);

    let first = client.get_json::<Forecast>("/stable").await;
    let second = client.get_json::<Forecast>("/stable").await;
    assert!(first.is_success() && second.is_success());
    assert_eq!(first.ok(), second.ok());
}

#[tokio::test]
async fn test_interceptor_order_over_the_wire() {
    let server = server().await;
    server.mock("/trail", MockResponse::text(200, "ok"));

    let observed = Arc::new(Mutex::new(Vec::new()));
    let marker = |name: &'static str, observed: Arc<Mutex<Vec<&'static str>>>| {
        FnInterceptor::new(name, move |ctx, request, next| {
            let observed = observed.clone();
            Box::pin(async move {
                let trail = match request.header("X-Trail") {
                    Some(existing) => format!("{existing},{name}"),
                    None => name.to_string(),
                };
                let response = next.run(ctx, request.with_header("X-Trail", trail)).await;
                observed.lock().push(name);
                response
            })
        })
    };

    let client = HttpClient::builder()
        .base_url(server.base_url())
        .interceptor(marker("A", observed.clone()))
        .interceptor(marker("B", observed.clone()))
        .build()
        .unwrap();
    assert_eq!(client.pipeline().stage_names(), vec!["A", "B"]);

    assert!(client.get_text("/trail").await.is_success());
    assert_eq!(server.received()[0].header("x-trail"), Some("A,B"));
    assert_eq!(*observed.lock(), vec!["B", "A"]);
}

#[tokio::test]
async fn test_auth_and_logging_interceptors() {
    let server = server().await;
    server.mock("/secure", MockResponse::json(200, r#"{"ok":true}"#));

    let lines = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink_lines = lines.clone();
    let client = HttpClient::builder()
        .base_url(server.base_url())
        .interceptor(AuthInterceptor::new(|| async { Some("Bearer abc".to_string()) }))
        .logging_interceptor(
            LoggingInterceptor::new(LogLevel::Headers)
                .with_sink(Arc::new(move |line: &str| sink_lines.lock().push(line.to_string()))),
        )
        .build()
        .unwrap();
    assert_eq!(client.pipeline().stage_names(), vec!["auth", "logging"]);

    assert!(client.get_text("/secure").await.is_success());
    assert_eq!(server.received()[0].header("authorization"), Some("Bearer abc"));

    let lines = lines.lock();
    assert!(lines.iter().any(|l| l.starts_with("GET http://") && l.ends_with("/secure")));
    assert!(lines.iter().any(|l| l == "  Authorization: Bearer abc"));
    assert!(lines.iter().any(|l| l.contains("200 OK")));
}

#[tokio::test]
async fn test_redirect_303_becomes_get() {
    let server = server().await;
    server
        .mock("/submit", MockResponse::redirect(303, "/result"))
        .mock("/result", MockResponse::text(200, "done"));

    let response = client_for(&server)
        .post("/submit", &Text, |r| r.text_body("payload"))
        .await;
    assert_eq!(response.ok().as_deref(), Some("done"));

    let received = server.received();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].method, http::Method::POST);
    assert_eq!(received[1].method, http::Method::GET);
    assert!(received[1].body.is_empty());
}

#[tokio::test]
async fn test_redirect_307_replays_body() {
    let server = server().await;
    server
        .mock("/old", MockResponse::redirect(307, "/new"))
        .mock("/new", MockResponse::text(200, "moved"));

    let response = client_for(&server)
        .post("/old", &Text, |r| r.text_body("payload"))
        .await;
    assert_eq!(response.ok().as_deref(), Some("moved"));

    let received = server.received();
    assert_eq!(received[1].method, http::Method::POST);
    assert_eq!(received[1].body_text(), "payload");
}

#[tokio::test]
async fn test_redirect_loop_is_bounded() {
    let server = server().await;
    server
        .mock("/a", MockResponse::redirect(302, "/b"))
        .mock("/b", MockResponse::redirect(302, "/a"));

    let client = HttpClient::builder()
        .base_url(server.base_url())
        .max_redirects(3)
        .build()
        .unwrap();
    let response = client.get_text("/a").await;

    let HttpResponse::Error(CallError::Transport(failure)) = response else {
        panic!("expected transport error, got {response:?}");
    };
    assert_eq!(failure.kind(), TransportFailureKind::TooManyRedirects);
    assert_eq!(server.received().len(), 4);
}

#[tokio::test]
async fn test_redirects_disabled_returns_3xx_failure() {
    let server = server().await;
    server.mock("/a", MockResponse::redirect(301, "/b"));

    let client = HttpClient::builder()
        .base_url(server.base_url())
        .max_redirects(0)
        .build()
        .unwrap();
    let response = client.get_text("/a").await;

    let HttpResponse::Failure(failure) = response else {
        panic!("expected failure");
    };
    assert_eq!(failure.status_code, 301);
    assert_eq!(failure.headers.first("location"), Some("/b"));
}

#[tokio::test]
async fn test_cross_host_redirect_drops_authorization() {
    let origin = server().await;
    let elsewhere = server().await;
    origin.mock("/go", MockResponse::redirect(302, elsewhere.url("/landing")));
    elsewhere.mock("/landing", MockResponse::text(200, "landed"));

    let response = client_for(&origin)
        .get("/go", &Text, |r| r.header("Authorization", "Bearer secret"))
        .await;
    assert_eq!(response.ok().as_deref(), Some("landed"));

    assert_eq!(origin.received()[0].header("authorization"), Some("Bearer secret"));
    assert_eq!(elsewhere.received()[0].header("authorization"), None);
}

#[tokio::test]
async fn test_verb_sets_method_after_customizer() {
    let server = server().await;
    server.mock("/x", MockResponse::text(200, "ok"));

    let _ = client_for(&server)
        .get("/x", &Text, |r| r.method(Method::Put).text_body("b"))
        .await;
    let received = &server.received()[0];
    assert_eq!(received.method, http::Method::GET);
    assert!(received.body.is_empty());
}

#[tokio::test]
async fn test_relative_path_starting_with_http_uses_base() {
    let server = server().await;
    server.mock("/api/httpbin/get", MockResponse::text(200, "joined"));

    let client = HttpClient::builder()
        .base_url(format!("{}/api/", server.base_url()))
        .build()
        .unwrap();
    let response = client.get_text("httpbin/get").await;

    assert_eq!(response.ok().as_deref(), Some("joined"));
    assert_eq!(server.received()[0].path(), "/api/httpbin/get");
}

#[tokio::test]
#[should_panic(expected = "request URL cannot be empty")]
async fn test_empty_url_is_a_programming_error() {
    let server = server().await;
    let _ = client_for(&server).get_text("").await;
}

#[tokio::test]
async fn test_invalid_base_url_is_rejected() {
    let err = HttpClient::builder().base_url("not a url").build().unwrap_err();
    assert!(err.to_string().contains("not a url"));
}
