//! TLS trust and certificate pinning over a real handshake.
//!
//! Servers present freshly generated self-signed `localhost` certificates.

use courier_client::HttpClient;
use courier_core::{CallError, HttpResponse, TransportFailureKind};
use courier_test::{MockResponse, MockServer, SelfSignedCert};
use courier_tls::{CertificateDer, CertificatePinner, TlsPolicy};

async fn tls_server(cert: &SelfSignedCert) -> MockServer {
    let server = MockServer::start_tls(cert).await.unwrap();
    server.mock("/ping", MockResponse::text(200, "pong"));
    server
}

fn client(policy: TlsPolicy) -> HttpClient {
    HttpClient::builder().tls_policy(policy).build().unwrap()
}

fn transport_kind<T>(response: &HttpResponse<T>) -> Option<TransportFailureKind> {
    match response {
        HttpResponse::Error(CallError::Transport(failure)) => Some(failure.kind()),
        _ => None,
    }
}

#[tokio::test]
async fn test_trusted_certificate_succeeds() {
    let cert = SelfSignedCert::localhost().unwrap();
    let server = tls_server(&cert).await;

    let policy = TlsPolicy::builder()
        .trust_roots([cert.certificate()])
        .build();
    let response = client(policy).get_text(&server.url("/ping")).await;

    assert_eq!(response.ok().as_deref(), Some("pong"));
    assert_eq!(server.received().len(), 1);
}

#[tokio::test]
async fn test_untrusted_certificate_is_tls_error() {
    let cert = SelfSignedCert::localhost().unwrap();
    let server = tls_server(&cert).await;

    let response = client(TlsPolicy::default()).get_text(&server.url("/ping")).await;

    assert_eq!(transport_kind(&response), Some(TransportFailureKind::Tls));
    assert!(response.is_network_error());
    assert!(server.received().is_empty());
}

#[tokio::test]
async fn test_matching_pin_succeeds() {
    let cert = SelfSignedCert::localhost().unwrap();
    let server = tls_server(&cert).await;

    let pinner = CertificatePinner::builder()
        .add("localhost", [cert.pin()])
        .build();
    let policy = TlsPolicy::builder()
        .trust_roots([cert.certificate()])
        .certificate_pinner(pinner)
        .build();

    let response = client(policy).get_text(&server.url("/ping")).await;
    assert!(response.is_success(), "{response:?}");
}

#[tokio::test]
async fn test_pin_mismatch_is_security_error() {
    let cert = SelfSignedCert::localhost().unwrap();
    let other = SelfSignedCert::localhost().unwrap();
    let server = tls_server(&cert).await;

    let pinner = CertificatePinner::builder()
        .add("localhost", [other.pin()])
        .build();
    let policy = TlsPolicy::builder()
        .trust_roots([cert.certificate()])
        .certificate_pinner(pinner)
        .build();

    let response = client(policy).get_text(&server.url("/ping")).await;

    let HttpResponse::Error(error) = &response else {
        panic!("expected error, got {response:?}");
    };
    assert!(error.is_security_error());
    assert!(error.is_network_error());
    let failure = error.transport().unwrap();
    assert_eq!(failure.kind(), TransportFailureKind::CertificatePinning);
    assert!(failure.message().contains("Certificate pinning failure!"));
    assert!(failure.message().contains(&cert.pin()));
    assert!(failure.message().contains(&other.pin()));

    // The connection is torn down before the request is written.
    assert!(server.received().is_empty());
}

#[tokio::test]
async fn test_pins_apply_even_when_trusting_everything() {
    let cert = SelfSignedCert::localhost().unwrap();
    let other = SelfSignedCert::localhost().unwrap();
    let server = tls_server(&cert).await;

    let insecure = TlsPolicy::builder().danger_accept_invalid_certs(true).build();
    assert!(client(insecure).get_text(&server.url("/ping")).await.is_success());

    let pinned = TlsPolicy::builder()
        .danger_accept_invalid_certs(true)
        .certificate_pinner(
            CertificatePinner::builder()
                .add("localhost", [other.pin()])
                .build(),
        )
        .build();
    let response = client(pinned).get_text(&server.url("/ping")).await;
    assert_eq!(
        transport_kind(&response),
        Some(TransportFailureKind::CertificatePinning)
    );
}

#[tokio::test]
async fn test_unpinned_host_fails_open() {
    let cert = SelfSignedCert::localhost().unwrap();
    let other = SelfSignedCert::localhost().unwrap();
    let server = tls_server(&cert).await;

    let pinner = CertificatePinner::builder()
        .add("api.example.com", [other.pin()])
        .add("localhost", ["sha256/not-base64!"])
        .build();
    let policy = TlsPolicy::builder()
        .trust_roots([cert.certificate()])
        .certificate_pinner(pinner)
        .build();

    let response = client(policy).get_text(&server.url("/ping")).await;
    assert!(response.is_success(), "{response:?}");
}

#[tokio::test]
async fn test_hostname_verifier_accepts_other_name() {
    let cert = SelfSignedCert::generate(&["service.internal"]).unwrap();
    let server = tls_server(&cert).await;

    let strict = TlsPolicy::builder()
        .trust_roots([cert.certificate()])
        .build();
    let response = client(strict).get_text(&server.url("/ping")).await;
    assert_eq!(transport_kind(&response), Some(TransportFailureKind::Tls));

    let relaxed = TlsPolicy::builder()
        .trust_roots([cert.certificate()])
        .hostname_verifier(|host: &str, _cert: &CertificateDer<'_>| host == "localhost")
        .build();
    let response = client(relaxed).get_text(&server.url("/ping")).await;
    assert!(response.is_success(), "{response:?}");
}
