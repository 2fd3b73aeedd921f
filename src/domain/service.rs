use crate::error::ProxyError;
use serde::{Deserialize, Serialize};
use url::Url;

/// A named logical backend: an ordered, non-empty set of upstream origin
/// URLs the load balancer distributes over. Services are created and
/// replaced by the external catalog; the core only observes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub servers: Vec<Url>,
}

impl Service {
    pub fn new(name: impl Into<String>, servers: &[&str]) -> Result<Self, ProxyError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ProxyError::InvalidService("name cannot be empty".into()));
        }

        if servers.is_empty() {
            return Err(ProxyError::InvalidService(format!(
                "service {}: at least one server is required",
                name
            )));
        }

        let servers = servers
            .iter()
            .map(|s| {
                Url::parse(s)
                    .map_err(|e| ProxyError::InvalidService(format!("service {}: {}", name, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { name, servers })
    }
}
