use crate::domain::Certificate;
use crate::error::ProxyError;
use crate::handlers::SharedHandler;
use async_trait::async_trait;
use url::Url;

/// A plaintext route sink. Routes are keyed by URL; `upsert_route` is
/// idempotent: repeating a call with identical arguments is a no-op in
/// effect, and a different handler at the same URL replaces the binding
/// atomically from the caller's perspective.
#[async_trait]
pub trait WebServer: Send + Sync {
    async fn upsert_route(&self, route: &Url, handler: SharedHandler) -> Result<(), ProxyError>;

    /// Removes a route. The reconciler never calls this; it exists for
    /// operators driving the web server directly.
    async fn delete_route(&self, route: &Url);
}

/// A TLS-capable route sink: everything a `WebServer` does, plus
/// certificate bindings keyed by host name. Certificate upserts are
/// idempotent under the same contract as routes.
#[async_trait]
pub trait SecureWebServer: WebServer {
    async fn upsert_certificate(
        &self,
        host: &str,
        certificate: &Certificate,
    ) -> Result<(), ProxyError>;
}

/// Produces per-service request handlers. On success the returned handler
/// forwards to the given upstream set; the forwarding policy is the
/// implementation's own business.
#[async_trait]
pub trait LoadBalancer: Send + Sync {
    async fn upsert_service(
        &self,
        name: &str,
        servers: &[Url],
    ) -> Result<SharedHandler, ProxyError>;
}
