//! Self-signed certificates for TLS tests.

use courier_tls::Pin;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::ServerConfig;
use std::sync::Arc;

use crate::error::TestError;

/// A freshly generated self-signed certificate and its private key.
///
/// # Example
///
/// ```
/// use courier_test::SelfSignedCert;
///
/// let cert = SelfSignedCert::localhost().unwrap();
/// assert!(cert.pin().starts_with("sha256/"));
/// ```
#[derive(Debug, Clone)]
pub struct SelfSignedCert {
    certificate: CertificateDer<'static>,
    key: Vec<u8>,
    pin: Pin,
}

impl SelfSignedCert {
    /// Generates a certificate valid for `names`.
    pub fn generate(names: &[&str]) -> Result<Self, TestError> {
        let names: Vec<String> = names.iter().map(|name| (*name).to_string()).collect();
        let certified = rcgen::generate_simple_self_signed(names)?;
        let certificate = certified.cert.der().clone();
        let pin =
            Pin::of_certificate(&certificate).map_err(|e| TestError::Certificate(e.to_string()))?;

        Ok(Self {
            certificate,
            key: certified.key_pair.serialize_der(),
            pin,
        })
    }

    /// Generates a certificate for `localhost`.
    pub fn localhost() -> Result<Self, TestError> {
        Self::generate(&["localhost"])
    }

    /// Returns the DER certificate, for use as a trust root.
    #[must_use]
    pub fn certificate(&self) -> CertificateDer<'static> {
        self.certificate.clone()
    }

    /// Returns the `sha256/<base64>` pin of the certificate's public key.
    #[must_use]
    pub fn pin(&self) -> String {
        self.pin.to_string()
    }

    /// Builds a server configuration presenting this certificate.
    pub fn server_config(&self) -> Result<Arc<ServerConfig>, TestError> {
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(self.key.clone()));
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let mut config = ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .with_no_client_auth()
            .with_single_cert(vec![self.certificate.clone()], key)?;
        config.alpn_protocols = vec![b"http/1.1".to_vec()];

        Ok(Arc::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_certificate_has_its_own_pin() {
        let first = SelfSignedCert::localhost().unwrap();
        let second = SelfSignedCert::localhost().unwrap();
        assert_ne!(first.pin(), second.pin());
        assert_eq!(first.pin().parse::<Pin>().unwrap().to_string(), first.pin());
    }

    #[test]
    fn test_server_config_builds() {
        let cert = SelfSignedCert::generate(&["localhost", "api.example.com"]).unwrap();
        let config = cert.server_config().unwrap();
        assert_eq!(config.alpn_protocols, vec![b"http/1.1".to_vec()]);
    }
}
