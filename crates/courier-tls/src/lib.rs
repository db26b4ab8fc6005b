//! # Courier TLS
//!
//! TLS policy and public key pinning for the Courier HTTP client.
//!
//! - [`TlsPolicy`]: trust, hostname and pinning overrides resolved into a
//!   rustls [`ClientConfig`](rustls::ClientConfig)
//! - [`CertificatePinner`]: host-to-pin table checked against the peer chain
//!   once the handshake has completed
//! - [`Pin`]: a `sha256/<base64>` SubjectPublicKeyInfo hash
//!
//! ## Example
//!
//! ```
//! use courier_tls::{CertificatePinner, TlsPolicy};
//!
//! let policy = TlsPolicy::builder()
//!     .certificate_pinner(
//!         CertificatePinner::builder()
//!             .add("*.example.com", ["sha256/AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="])
//!             .build(),
//!     )
//!     .build();
//! # let _ = policy;
//! ```

#![doc(html_root_url = "https://docs.rs/courier-tls/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod pin;
mod pinner;
mod policy;
mod verifier;

pub use error::{PinError, TlsError, TlsResult};
pub use pin::{spki_sha256, Pin, SHA256};
pub use pinner::{CertificatePinner, CertificatePinnerBuilder};
pub use policy::{default_root_store, TlsPolicy, TlsPolicyBuilder};
pub use verifier::HostnameVerifier;

/// Re-exported rustls types used in this crate's public API.
pub use rustls::pki_types::CertificateDer;
pub use rustls::ClientConfig;
