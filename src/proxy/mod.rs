pub mod registry;

use crate::handlers::{Redirect, ServiceNotConfigured, SharedHandler};
use crate::interfaces::{
    FrontendEvent, FrontendRepository, FrontendWatcher, LoadBalancer, SecureWebServer,
    ServiceEvent, ServiceRepository, ServiceWatcher, WebServer,
};
use registry::ServiceHandlers;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Fallback resync period. Polling cannot be disabled: it is the safety net
/// against missed watcher events, so a zero interval is normalized to this.
pub(crate) const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(5 * 60);

const EVENT_BUFFER_SIZE: usize = 10;

pub(crate) fn effective_polling_interval(interval: Duration) -> Duration {
    if interval.is_zero() {
        DEFAULT_POLLING_INTERVAL
    } else {
        interval
    }
}

/// The reconciliation coordinator: single writer of the handler registry,
/// sole consumer of the event channels, driven by `run`.
pub(crate) struct Proxy {
    cancellation: CancellationToken,
    service_repository: Arc<dyn ServiceRepository>,
    frontend_repository: Arc<dyn FrontendRepository>,
    service_watcher: Option<Arc<dyn ServiceWatcher>>,
    frontend_watcher: Option<Arc<dyn FrontendWatcher>>,
    polling_interval: Duration,
    web_server: Option<Arc<dyn WebServer>>,
    secure_web_server: Option<Arc<dyn SecureWebServer>>,
    load_balancer: Arc<dyn LoadBalancer>,
    handlers: ServiceHandlers,
}

#[allow(clippy::too_many_arguments)]
impl Proxy {
    pub(crate) fn new(
        cancellation: CancellationToken,
        service_repository: Arc<dyn ServiceRepository>,
        frontend_repository: Arc<dyn FrontendRepository>,
        service_watcher: Option<Arc<dyn ServiceWatcher>>,
        frontend_watcher: Option<Arc<dyn FrontendWatcher>>,
        polling_interval: Duration,
        web_server: Option<Arc<dyn WebServer>>,
        secure_web_server: Option<Arc<dyn SecureWebServer>>,
        load_balancer: Arc<dyn LoadBalancer>,
    ) -> Self {
        Self {
            cancellation,
            service_repository,
            frontend_repository,
            service_watcher,
            frontend_watcher,
            polling_interval: effective_polling_interval(polling_interval),
            web_server,
            secure_web_server,
            load_balancer,
            handlers: ServiceHandlers::new(),
        }
    }

    /// Reconciliation loop: full resync at startup, then multiplex
    /// cancellation, the poll ticker and the two event streams. One selected
    /// action runs to completion before the next event is consumed.
    pub(crate) async fn run(self) {
        self.configure().await;

        let (service_tx, mut service_events) = mpsc::channel::<ServiceEvent>(EVENT_BUFFER_SIZE);
        if let Some(watcher) = &self.service_watcher {
            info!("proxy: subscribing to service watcher");
            watcher.subscribe(service_tx.clone());
        }

        let (frontend_tx, mut frontend_events) = mpsc::channel::<FrontendEvent>(EVENT_BUFFER_SIZE);
        if let Some(watcher) = &self.frontend_watcher {
            info!("proxy: subscribing to frontend watcher");
            watcher.subscribe(frontend_tx.clone());
        }

        // The original senders stay owned here so the channels close exactly
        // when the loop returns; watcher sends after that fail as benign
        // drops.
        let _service_tx = service_tx;
        let _frontend_tx = frontend_tx;

        let mut poll = time::interval_at(
            Instant::now() + self.polling_interval,
            self.polling_interval,
        );
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancellation.cancelled() => {
                    info!("proxy: context is done, returning");
                    return;
                }

                _ = poll.tick() => {
                    info!("proxy: polling configuration");
                    self.configure().await;
                }

                Some(event) = service_events.recv() => {
                    info!("proxy: received service event, name={}", event.name);
                    self.reconcile_service(&event.name).await;
                }

                Some(event) = frontend_events.recv() => {
                    info!("proxy: received frontend event, name={}", event.name);
                    self.reconcile_frontend(&event.name).await;
                }
            }
        }
    }

    /// Full resync. Services go first so the handler registry is populated
    /// before any frontend route references it.
    async fn configure(&self) {
        match self.service_repository.list_services().await {
            Ok(names) => {
                for name in names {
                    self.reconcile_service(&name).await;
                }
            }
            Err(e) => error!("proxy: listing services failed, error={}", e),
        }

        match self.frontend_repository.list_frontends().await {
            Ok(names) => {
                for name in names {
                    self.reconcile_frontend(&name).await;
                }
            }
            Err(e) => error!("proxy: listing frontends failed, error={}", e),
        }
    }

    /// Translate one service description into load-balancer state and a
    /// registry entry. On load-balancer failure the registry entry becomes
    /// the 500 stub: the invariant is "every described name has a live
    /// handler", and partial failure is expressed in the response.
    async fn reconcile_service(&self, name: &str) {
        let service = match self.service_repository.describe_service(name).await {
            Ok(service) => service,
            Err(e) => {
                error!("proxy: describing service failed, name={}, error={}", name, e);
                return;
            }
        };

        let mut handlers = self.handlers.lock().await;

        debug!(
            "proxy: configuring service, name={}, servers={}",
            service.name,
            service.servers.len()
        );

        let handler: SharedHandler = match self
            .load_balancer
            .upsert_service(&service.name, &service.servers)
            .await
        {
            Ok(handler) => handler,
            Err(e) => {
                error!("proxy: upserting service failed, name={}, error={}", name, e);
                Arc::new(ServiceNotConfigured)
            }
        };

        handlers.set(service.name, handler);
    }

    /// Translate one frontend description into routes. Secure frontends get
    /// a certificate binding, a TLS route and a plaintext 301 redirect, in
    /// that order; plaintext frontends get a single route. Each collaborator
    /// failure is logged and the remaining steps still run; the next poll
    /// repairs partial state.
    async fn reconcile_frontend(&self, name: &str) {
        let frontend = match self.frontend_repository.describe_frontend(name).await {
            Ok(frontend) => frontend,
            Err(e) => {
                error!("proxy: describing frontend failed, name={}, error={}", name, e);
                return;
            }
        };

        // The registry stays locked across every upsert below, so a
        // concurrent service reconcile cannot slip a newer handler in after
        // this lookup.
        let handlers = self.handlers.lock().await;
        let handler = handlers.get(&frontend.service_name);

        debug!(
            "proxy: configuring frontend, name={}, url={}, service_name={}",
            frontend.name, frontend.url, frontend.service_name
        );

        if let Some(certificate) = &frontend.certificate {
            match &self.secure_web_server {
                Some(secure) => {
                    if let Err(e) = secure
                        .upsert_certificate(frontend.host(), certificate)
                        .await
                    {
                        error!(
                            "proxy: upserting certificate failed, host={}, error={}",
                            frontend.host(),
                            e
                        );
                    }

                    if let Err(e) = secure.upsert_route(&frontend.url, handler).await {
                        error!(
                            "proxy: upserting route failed, url={}, error={}",
                            frontend.url, e
                        );
                    }
                }
                None => debug!(
                    "proxy: no secure web server configured, skipping tls route, name={}",
                    frontend.name
                ),
            }

            match &self.web_server {
                Some(web_server) => {
                    let redirect: SharedHandler =
                        Arc::new(Redirect::permanent(frontend.url.clone()));

                    if let Err(e) = web_server
                        .upsert_route(&frontend.http_redirect_url(), redirect)
                        .await
                    {
                        error!(
                            "proxy: upserting redirect route failed, url={}, error={}",
                            frontend.url, e
                        );
                    }
                }
                None => debug!(
                    "proxy: no plaintext web server configured, skipping redirect, name={}",
                    frontend.name
                ),
            }
        } else {
            match &self.web_server {
                Some(web_server) => {
                    if let Err(e) = web_server.upsert_route(&frontend.url, handler).await {
                        error!(
                            "proxy: upserting route failed, url={}, error={}",
                            frontend.url, e
                        );
                    }
                }
                None => debug!(
                    "proxy: no plaintext web server configured, skipping route, name={}",
                    frontend.name
                ),
            }
        }
    }
}
