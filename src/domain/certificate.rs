use serde::{Deserialize, Serialize};
use std::fmt;

/// TLS material for a secure frontend: leaf certificate, private key and an
/// optional chain, all PEM-encoded. The core never inspects the bytes, it
/// only hands the bundle to the TLS web server keyed by host name.
///
/// Certificates are values: two bundles are equal when their content is.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub certificate: String,
    pub private_key: String,
    pub chain: Option<String>,
}

impl Certificate {
    pub fn new(certificate: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            certificate: certificate.into(),
            private_key: private_key.into(),
            chain: None,
        }
    }

    pub fn with_chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = Some(chain.into());
        self
    }
}

// The private key must never end up in log output.
impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("certificate", &self.certificate)
            .field("private_key", &"<redacted>")
            .field("chain", &self.chain)
            .finish()
    }
}
