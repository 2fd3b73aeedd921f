use crate::error::ProxyError;
use crate::interfaces::{
    FrontendRepository, FrontendWatcher, LoadBalancer, SecureWebServer, ServiceRepository,
    ServiceWatcher, WebServer,
};
use crate::proxy::Proxy;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Input for [`Command::execute`]. Every slot except the polling interval is
/// optional; `execute` validates the combination before anything is spawned.
pub struct Model {
    /// Cancellation signal bounding the proxy's lifetime. `None` is
    /// normalized to a fresh, never-cancelled token.
    pub cancellation: Option<CancellationToken>,

    /// Web server for plaintext frontends, and for the permanent redirects
    /// installed on behalf of secure frontends.
    pub http_web_server: Option<Arc<dyn WebServer>>,

    /// Web server for frontends with a certificate.
    pub https_web_server: Option<Arc<dyn SecureWebServer>>,

    /// Produces the per-service request handlers the routes point at.
    pub load_balancer: Option<Arc<dyn LoadBalancer>>,

    /// Full-resync period. Zero is normalized to the five-minute default:
    /// polling is the safety net against missed watcher events and cannot
    /// be disabled.
    pub polling_interval: Duration,
}

/// The start-proxy command: validates its collaborators, builds the
/// reconciliation coordinator and launches its loop.
pub struct Command {
    frontend_repository: Arc<dyn FrontendRepository>,
    service_repository: Arc<dyn ServiceRepository>,
    frontend_watcher: Option<Arc<dyn FrontendWatcher>>,
    service_watcher: Option<Arc<dyn ServiceWatcher>>,
}

impl Command {
    /// Builds a command driven by polling alone.
    pub fn new(
        frontend_repository: Option<Arc<dyn FrontendRepository>>,
        service_repository: Option<Arc<dyn ServiceRepository>>,
    ) -> Result<Self, ProxyError> {
        Ok(Self {
            frontend_repository: frontend_repository
                .ok_or(ProxyError::FrontendRepositoryMissing)?,
            service_repository: service_repository.ok_or(ProxyError::ServiceRepositoryMissing)?,
            frontend_watcher: None,
            service_watcher: None,
        })
    }

    /// Builds a command that additionally consumes change notifications.
    /// Repositories frequently offer the watcher capability themselves; the
    /// same object can fill both slots through two `Arc` coercions.
    pub fn with_watchers(
        frontend_repository: Option<Arc<dyn FrontendRepository>>,
        service_repository: Option<Arc<dyn ServiceRepository>>,
        frontend_watcher: Option<Arc<dyn FrontendWatcher>>,
        service_watcher: Option<Arc<dyn ServiceWatcher>>,
    ) -> Result<Self, ProxyError> {
        let mut command = Self::new(frontend_repository, service_repository)?;
        command.frontend_watcher =
            Some(frontend_watcher.ok_or(ProxyError::FrontendWatcherMissing)?);
        command.service_watcher = Some(service_watcher.ok_or(ProxyError::ServiceWatcherMissing)?);
        Ok(command)
    }

    /// Validates the model, then launches the reconciliation loop onto the
    /// ambient Tokio runtime and returns immediately. Must be called from
    /// within a runtime. Runtime failures after this point are logged, never
    /// returned; the only way the loop ends is cancellation.
    pub fn execute(&self, model: Model) -> Result<(), ProxyError> {
        if model.http_web_server.is_none() && model.https_web_server.is_none() {
            return Err(ProxyError::WebServersMissing);
        }

        let load_balancer = model.load_balancer.ok_or(ProxyError::LoadBalancerMissing)?;
        let cancellation = model.cancellation.unwrap_or_default();

        let proxy = Proxy::new(
            cancellation,
            self.service_repository.clone(),
            self.frontend_repository.clone(),
            self.service_watcher.clone(),
            self.frontend_watcher.clone(),
            model.polling_interval,
            model.http_web_server,
            model.https_web_server,
            load_balancer,
        );

        tokio::spawn(proxy.run());

        Ok(())
    }
}
