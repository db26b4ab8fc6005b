//! Public key pins.
//!
//! A pin is the SHA-256 hash of a certificate's DER-encoded
//! SubjectPublicKeyInfo, written as `sha256/<base64>`.

use crate::error::PinError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rustls::pki_types::CertificateDer;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// The only supported pin hash algorithm.
pub const SHA256: &str = "sha256";

/// A parsed `sha256/<base64>` pin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pin {
    hash: [u8; 32],
}

impl Pin {
    /// Creates a pin from a raw SHA-256 digest.
    #[must_use]
    pub const fn from_sha256(hash: [u8; 32]) -> Self {
        Self { hash }
    }

    /// Parses a pin of the form `sha256/<base64>`.
    ///
    /// The algorithm tag is case-insensitive.
    pub fn parse(pin: &str) -> Result<Self, PinError> {
        let (algorithm, encoded) = pin
            .split_once('/')
            .ok_or_else(|| PinError::invalid(pin, "expected '<algorithm>/<base64 hash>'"))?;

        if !algorithm.eq_ignore_ascii_case(SHA256) {
            return Err(PinError::invalid(pin, "only sha256 pins are supported"));
        }

        let bytes = STANDARD
            .decode(encoded)
            .map_err(|_| PinError::invalid(pin, "hash is not valid base64"))?;
        let hash: [u8; 32] = bytes
            .try_into()
            .map_err(|_| PinError::invalid(pin, "hash is not 32 bytes"))?;

        Ok(Self { hash })
    }

    /// Computes the pin of a DER-encoded certificate.
    pub fn of_certificate(cert: &CertificateDer<'_>) -> Result<Self, PinError> {
        spki_sha256(cert).map(Self::from_sha256)
    }

    /// Returns the raw digest.
    #[must_use]
    pub const fn hash(&self) -> &[u8; 32] {
        &self.hash
    }

    /// Returns the hash algorithm tag.
    #[must_use]
    pub const fn algorithm(&self) -> &'static str {
        SHA256
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SHA256}/{}", STANDARD.encode(self.hash))
    }
}

impl FromStr for Pin {
    type Err = PinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Hashes the SubjectPublicKeyInfo of a DER-encoded certificate.
pub fn spki_sha256(cert: &CertificateDer<'_>) -> Result<[u8; 32], PinError> {
    let (_, parsed) = x509_parser::parse_x509_certificate(cert.as_ref())
        .map_err(|e| PinError::BadCertificate(e.to_string()))?;
    Ok(Sha256::digest(parsed.public_key().raw).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_PIN: &str = "sha256/AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

    #[test]
    fn test_parse_and_display() {
        let pin = Pin::parse(ZERO_PIN).unwrap();
        assert_eq!(pin.hash(), &[0u8; 32]);
        assert_eq!(pin.to_string(), ZERO_PIN);
        assert_eq!(pin.algorithm(), "sha256");
    }

    #[test]
    fn test_algorithm_tag_is_case_insensitive() {
        let pin: Pin = "SHA256/AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="
            .parse()
            .unwrap();
        assert_eq!(pin, Pin::from_sha256([0; 32]));
    }

    #[test]
    fn test_rejects_malformed_pins() {
        for bad in [
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=",
            "sha1/AAAAAAAAAAAAAAAAAAAAAAAAAAA=",
            "sha256/not base64!",
            "sha256/AAAA",
            "",
        ] {
            assert!(
                matches!(Pin::parse(bad), Err(PinError::InvalidPin { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_garbage_certificate_is_rejected() {
        let cert = CertificateDer::from(vec![0x30, 0x03, 0x01, 0x01, 0xff]);
        assert!(matches!(
            Pin::of_certificate(&cert),
            Err(PinError::BadCertificate(_))
        ));
    }

    #[test]
    fn test_pin_matches_generated_key() {
        let generated = rcgen::generate_simple_self_signed(vec!["localhost".into()]).unwrap();
        let cert = CertificateDer::from(generated.cert);
        let expected = Pin::from_sha256(Sha256::digest(generated.key_pair.public_key_der()).into());
        assert_eq!(Pin::of_certificate(&cert).unwrap(), expected);
    }
}
