use crate::domain::Certificate;
use crate::error::ProxyError;
use serde::{Deserialize, Serialize};
use url::Url;

/// A publicly-addressable entry point into the proxy. The URL must be
/// absolute and carry a host; its path, if any, is the route prefix. The
/// presence of a certificate is what makes a frontend secure.
///
/// `service_name` references a service by name. Referential integrity is
/// advisory: a dangling reference is served by the not-found handler, not
/// rejected here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frontend {
    pub name: String,
    pub url: Url,
    pub service_name: String,
    pub certificate: Option<Certificate>,
}

impl Frontend {
    pub fn new(
        name: impl Into<String>,
        url: &str,
        certificate: Option<Certificate>,
        service_name: impl Into<String>,
    ) -> Result<Self, ProxyError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ProxyError::InvalidFrontend("name cannot be empty".into()));
        }

        let service_name = service_name.into();
        if service_name.is_empty() {
            return Err(ProxyError::InvalidFrontend(format!(
                "frontend {}: service name cannot be empty",
                name
            )));
        }

        let url = Url::parse(url)
            .map_err(|e| ProxyError::InvalidFrontend(format!("frontend {}: {}", name, e)))?;
        if url.host_str().is_none() {
            return Err(ProxyError::InvalidFrontend(format!(
                "frontend {}: url {} has no host",
                name, url
            )));
        }

        Ok(Self {
            name,
            url,
            service_name,
            certificate,
        })
    }

    /// Host component of the frontend URL. Validated present at construction.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or("")
    }

    pub fn is_secure(&self) -> bool {
        self.certificate.is_some()
    }

    /// The plaintext twin of this frontend's URL: same host, port, path and
    /// query, scheme forced to `http`. Secure frontends install their
    /// permanent redirect under this URL.
    pub fn http_redirect_url(&self) -> Url {
        let mut url = self.url.clone();
        // "http" is a valid special scheme, this cannot fail for an
        // absolute URL with a host.
        let _ = url.set_scheme("http");
        url
    }
}
