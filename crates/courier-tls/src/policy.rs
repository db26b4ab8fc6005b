//! TLS policy owned by the client.
//!
//! A [`TlsPolicy`] collects the optional overrides a client can apply to
//! secure connections and resolves them into a rustls [`ClientConfig`]:
//!
//! | Setting | Effect |
//! |---|---|
//! | `client_config` | Replaces the whole rustls configuration |
//! | `server_cert_verifier` | Replaces chain validation (trust roots) |
//! | `hostname_verifier` | Second opinion on name mismatches |
//! | `certificate_pinner` | Checked after the handshake by the transport |
//! | `danger_accept_invalid_certs` | Trust any chain for any host |
//!
//! Without overrides, chains are validated against the Mozilla root set
//! shipped in `webpki-roots`.

use crate::error::{PinError, TlsResult};
use crate::pinner::CertificatePinner;
use crate::verifier::{AcceptAnyCertificate, HostnameOverride, HostnameVerifier};
use rustls::client::danger::ServerCertVerifier;
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::CertificateDer;
use rustls::{ClientConfig, RootCertStore};
use std::fmt;
use std::sync::Arc;

/// ALPN identifier for HTTP/1.1, the only protocol the transport speaks.
const HTTP_1_1: &[u8] = b"http/1.1";

/// Immutable TLS settings for a client.
///
/// # Example
///
/// ```
/// use courier_tls::{CertificatePinner, TlsPolicy};
///
/// let policy = TlsPolicy::builder()
///     .certificate_pinner(
///         CertificatePinner::builder()
///             .add("api.example.com", ["sha256/AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="])
///             .build(),
///     )
///     .build();
///
/// assert!(policy.certificate_pinner().is_some());
/// let config = policy.client_config().unwrap();
/// assert_eq!(config.alpn_protocols, vec![b"http/1.1".to_vec()]);
/// ```
#[derive(Clone, Default)]
pub struct TlsPolicy {
    client_config: Option<Arc<ClientConfig>>,
    server_cert_verifier: Option<Arc<dyn ServerCertVerifier>>,
    hostname_verifier: Option<Arc<dyn HostnameVerifier>>,
    certificate_pinner: Option<CertificatePinner>,
    accept_invalid_certs: bool,
}

impl TlsPolicy {
    /// Creates a new policy builder.
    #[must_use]
    pub fn builder() -> TlsPolicyBuilder {
        TlsPolicyBuilder::default()
    }

    /// Returns the configured pinner.
    #[must_use]
    pub fn certificate_pinner(&self) -> Option<&CertificatePinner> {
        self.certificate_pinner.as_ref()
    }

    /// Returns true if certificate validation is disabled.
    #[must_use]
    pub const fn accepts_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    /// Runs the pin check for `host` against a negotiated peer chain.
    ///
    /// Always succeeds when no pinner is configured.
    pub fn check_pins(&self, host: &str, chain: &[CertificateDer<'_>]) -> Result<(), PinError> {
        match &self.certificate_pinner {
            Some(pinner) => pinner.check(host, chain),
            None => Ok(()),
        }
    }

    /// Resolves the rustls configuration for secure connections.
    ///
    /// An explicit `client_config` is returned as-is; otherwise one is
    /// assembled on the ring provider from the verifier overrides.
    pub fn client_config(&self) -> TlsResult<Arc<ClientConfig>> {
        if let Some(config) = &self.client_config {
            return Ok(config.clone());
        }

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let verifier = self.server_verifier(&provider)?;

        let mut config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(verifier)
            .with_no_client_auth();
        config.alpn_protocols = vec![HTTP_1_1.to_vec()];

        Ok(Arc::new(config))
    }

    fn server_verifier(
        &self,
        provider: &Arc<CryptoProvider>,
    ) -> TlsResult<Arc<dyn ServerCertVerifier>> {
        if self.accept_invalid_certs {
            tracing::warn!("TLS certificate validation is disabled");
            return Ok(Arc::new(AcceptAnyCertificate::new(provider.clone())));
        }

        let base: Arc<dyn ServerCertVerifier> = match &self.server_cert_verifier {
            Some(verifier) => verifier.clone(),
            None => WebPkiServerVerifier::builder_with_provider(
                Arc::new(default_root_store()),
                provider.clone(),
            )
            .build()?,
        };

        Ok(match &self.hostname_verifier {
            Some(hostname) => Arc::new(HostnameOverride::new(base, hostname.clone())),
            None => base,
        })
    }
}

impl fmt::Debug for TlsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsPolicy")
            .field("client_config", &self.client_config.is_some())
            .field("server_cert_verifier", &self.server_cert_verifier.is_some())
            .field("hostname_verifier", &self.hostname_verifier.is_some())
            .field("certificate_pinner", &self.certificate_pinner)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

/// Builder for [`TlsPolicy`].
#[derive(Default)]
pub struct TlsPolicyBuilder {
    policy: TlsPolicy,
}

impl TlsPolicyBuilder {
    /// Uses a complete rustls configuration instead of assembling one.
    ///
    /// Verifier overrides on this builder are then ignored; the pinner is
    /// still applied by the transport.
    #[must_use]
    pub fn client_config(mut self, config: Arc<ClientConfig>) -> Self {
        self.policy.client_config = Some(config);
        self
    }

    /// Replaces certificate chain validation.
    #[must_use]
    pub fn server_cert_verifier(mut self, verifier: Arc<dyn ServerCertVerifier>) -> Self {
        self.policy.server_cert_verifier = Some(verifier);
        self
    }

    /// Trusts only the given root certificates instead of the Mozilla set.
    ///
    /// Certificates that fail to parse are skipped with a warning.
    #[must_use]
    pub fn trust_roots<I>(self, roots: I) -> Self
    where
        I: IntoIterator<Item = CertificateDer<'static>>,
    {
        let mut store = RootCertStore::empty();
        let (added, ignored) = store.add_parsable_certificates(roots);
        if ignored > 0 {
            tracing::warn!(added, ignored, "Some trust roots could not be parsed");
        }

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        match WebPkiServerVerifier::builder_with_provider(Arc::new(store), provider).build() {
            Ok(verifier) => self.server_cert_verifier(verifier),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unusable trust roots");
                self
            }
        }
    }

    /// Accepts name mismatches that `verifier` approves.
    #[must_use]
    pub fn hostname_verifier(mut self, verifier: impl HostnameVerifier) -> Self {
        self.policy.hostname_verifier = Some(Arc::new(verifier));
        self
    }

    /// Pins public keys for specific hosts.
    #[must_use]
    pub fn certificate_pinner(mut self, pinner: CertificatePinner) -> Self {
        self.policy.certificate_pinner = Some(pinner);
        self
    }

    /// Trusts every certificate for every host.
    ///
    /// Only for local debugging against self-signed servers. Pins are still
    /// enforced.
    #[must_use]
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.policy.accept_invalid_certs = accept;
        self
    }

    /// Freezes the policy.
    #[must_use]
    pub fn build(self) -> TlsPolicy {
        self.policy
    }
}

/// Builds a root store from the bundled Mozilla roots.
#[must_use]
pub fn default_root_store() -> RootCertStore {
    RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect(),
    }
}
