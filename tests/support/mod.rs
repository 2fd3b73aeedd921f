//! In-memory test doubles for the repository and collaborator contracts,
//! plus a shared ordered call log so tests can assert cross-collaborator
//! call ordering.

// Each test binary links this module and uses a different subset of it.
#![allow(dead_code)]

use async_trait::async_trait;
use http::{Request, Response, StatusCode};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use switchyard::domain::{Certificate, Frontend, Service};
use switchyard::error::ProxyError;
use switchyard::handlers::{full_body, BoxBody, RequestHandler, SharedHandler};
use switchyard::interfaces::{
    FrontendEvent, FrontendRepository, FrontendWatcher, LoadBalancer, SecureWebServer,
    ServiceEvent, ServiceRepository, ServiceWatcher, WebServer,
};
use tokio::sync::mpsc;
use url::Url;

pub fn url(s: &str) -> Url {
    Url::parse(s).expect("test url must parse")
}

pub fn get(u: &str) -> Request<BoxBody> {
    Request::builder()
        .uri(u)
        .body(switchyard::handlers::empty_body())
        .unwrap()
}

pub async fn body_text(resp: Response<BoxBody>) -> String {
    use http_body_util::BodyExt;
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Polls `predicate` every 10ms until it holds, panicking after two seconds.
pub async fn wait_for(what: &str, predicate: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !predicate() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for: {}", what);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// ---------------------------------------------------------------------------
// Call log
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Index of the first entry starting with `prefix`.
    pub fn first_index_of(&self, prefix: &str) -> Option<usize> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .position(|e| e.starts_with(prefix))
    }

    pub fn count_of(&self, prefix: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

// ---------------------------------------------------------------------------
// Repositories (repository + watcher in one object, like the real catalogs)
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryServiceRepository {
    services: Mutex<HashMap<String, Service>>,
    fail_list: AtomicBool,
    subscriber: Mutex<Option<mpsc::Sender<ServiceEvent>>>,
}

impl InMemoryServiceRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, service: Service) {
        self.services
            .lock()
            .unwrap()
            .insert(service.name.clone(), service);
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn has_subscriber(&self) -> bool {
        self.subscriber.lock().unwrap().is_some()
    }

    pub fn subscriber_closed(&self) -> bool {
        self.subscriber
            .lock()
            .unwrap()
            .as_ref()
            .map(|tx| tx.is_closed())
            .unwrap_or(false)
    }

    /// Pushes a change event; returns false when there is no subscriber or
    /// the loop has gone away.
    pub fn publish(&self, name: &str) -> bool {
        let subscriber = self.subscriber.lock().unwrap();
        match subscriber.as_ref() {
            Some(tx) => tx.try_send(ServiceEvent { name: name.into() }).is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl ServiceRepository for InMemoryServiceRepository {
    async fn list_services(&self) -> Result<Vec<String>, ProxyError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ProxyError::Repository("service catalog unavailable".into()));
        }
        Ok(self.services.lock().unwrap().keys().cloned().collect())
    }

    async fn describe_service(&self, name: &str) -> Result<Service, ProxyError> {
        self.services
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ProxyError::UnknownService(name.into()))
    }
}

impl ServiceWatcher for InMemoryServiceRepository {
    fn subscribe(&self, events: mpsc::Sender<ServiceEvent>) {
        *self.subscriber.lock().unwrap() = Some(events);
    }
}

#[derive(Default)]
pub struct InMemoryFrontendRepository {
    frontends: Mutex<HashMap<String, Frontend>>,
    /// Names reported by list but not describable, simulating catalog
    /// entries deleted between the two calls.
    phantom_names: Mutex<Vec<String>>,
    fail_list: AtomicBool,
    subscriber: Mutex<Option<mpsc::Sender<FrontendEvent>>>,
}

impl InMemoryFrontendRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, frontend: Frontend) {
        self.frontends
            .lock()
            .unwrap()
            .insert(frontend.name.clone(), frontend);
    }

    pub fn insert_phantom(&self, name: &str) {
        self.phantom_names.lock().unwrap().push(name.into());
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn has_subscriber(&self) -> bool {
        self.subscriber.lock().unwrap().is_some()
    }

    pub fn subscriber_closed(&self) -> bool {
        self.subscriber
            .lock()
            .unwrap()
            .as_ref()
            .map(|tx| tx.is_closed())
            .unwrap_or(false)
    }

    pub fn publish(&self, name: &str) -> bool {
        let subscriber = self.subscriber.lock().unwrap();
        match subscriber.as_ref() {
            Some(tx) => tx.try_send(FrontendEvent { name: name.into() }).is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl FrontendRepository for InMemoryFrontendRepository {
    async fn list_frontends(&self) -> Result<Vec<String>, ProxyError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ProxyError::Repository(
                "frontend catalog unavailable".into(),
            ));
        }
        let mut names: Vec<String> = self.frontends.lock().unwrap().keys().cloned().collect();
        names.extend(self.phantom_names.lock().unwrap().iter().cloned());
        Ok(names)
    }

    async fn describe_frontend(&self, name: &str) -> Result<Frontend, ProxyError> {
        self.frontends
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ProxyError::UnknownFrontend(name.into()))
    }
}

impl FrontendWatcher for InMemoryFrontendRepository {
    fn subscribe(&self, events: mpsc::Sender<FrontendEvent>) {
        *self.subscriber.lock().unwrap() = Some(events);
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

pub struct RecordingWebServer {
    label: &'static str,
    log: CallLog,
    routes: Mutex<HashMap<Url, SharedHandler>>,
    fail_routes: AtomicBool,
}

impl RecordingWebServer {
    pub fn new(label: &'static str, log: CallLog) -> Arc<Self> {
        Arc::new(Self {
            label,
            log,
            routes: Mutex::new(HashMap::new()),
            fail_routes: AtomicBool::new(false),
        })
    }

    pub fn set_fail_routes(&self, fail: bool) {
        self.fail_routes.store(fail, Ordering::SeqCst);
    }

    pub fn handler_at(&self, route: &Url) -> Option<SharedHandler> {
        self.routes.lock().unwrap().get(route).cloned()
    }

    pub fn route_count(&self) -> usize {
        self.routes.lock().unwrap().len()
    }
}

#[async_trait]
impl WebServer for RecordingWebServer {
    async fn upsert_route(&self, route: &Url, handler: SharedHandler) -> Result<(), ProxyError> {
        self.log
            .record(format!("{}: upsert_route {}", self.label, route));
        if self.fail_routes.load(Ordering::SeqCst) {
            return Err(ProxyError::WebServer("injected route failure".into()));
        }
        self.routes.lock().unwrap().insert(route.clone(), handler);
        Ok(())
    }

    async fn delete_route(&self, route: &Url) {
        self.log
            .record(format!("{}: delete_route {}", self.label, route));
        self.routes.lock().unwrap().remove(route);
    }
}

pub struct RecordingSecureWebServer {
    inner: Arc<RecordingWebServer>,
    certificates: Mutex<HashMap<String, Certificate>>,
}

impl RecordingSecureWebServer {
    pub fn new(log: CallLog) -> Arc<Self> {
        Arc::new(Self {
            inner: RecordingWebServer::new("https", log),
            certificates: Mutex::new(HashMap::new()),
        })
    }

    pub fn handler_at(&self, route: &Url) -> Option<SharedHandler> {
        self.inner.handler_at(route)
    }

    pub fn route_count(&self) -> usize {
        self.inner.route_count()
    }

    pub fn certificate_for(&self, host: &str) -> Option<Certificate> {
        self.certificates.lock().unwrap().get(host).cloned()
    }
}

#[async_trait]
impl WebServer for RecordingSecureWebServer {
    async fn upsert_route(&self, route: &Url, handler: SharedHandler) -> Result<(), ProxyError> {
        self.inner.upsert_route(route, handler).await
    }

    async fn delete_route(&self, route: &Url) {
        self.inner.delete_route(route).await;
    }
}

#[async_trait]
impl SecureWebServer for RecordingSecureWebServer {
    async fn upsert_certificate(
        &self,
        host: &str,
        certificate: &Certificate,
    ) -> Result<(), ProxyError> {
        self.inner
            .log
            .record(format!("https: upsert_certificate {}", host));
        self.certificates
            .lock()
            .unwrap()
            .insert(host.into(), certificate.clone());
        Ok(())
    }
}

/// Handler produced by the recording load balancer: identifies its service
/// so tests can tell which upstream set a route ended up wired to.
struct EchoHandler {
    service: String,
}

#[async_trait]
impl RequestHandler for EchoHandler {
    async fn handle(&self, _req: Request<BoxBody>) -> Response<BoxBody> {
        let mut resp = Response::new(full_body(format!("service: {}", self.service)));
        *resp.status_mut() = StatusCode::OK;
        resp
    }
}

#[derive(Default)]
pub struct RecordingLoadBalancer {
    log: CallLog,
    services: Mutex<HashMap<String, Vec<Url>>>,
    fail: AtomicBool,
}

impl RecordingLoadBalancer {
    pub fn new(log: CallLog) -> Arc<Self> {
        Arc::new(Self {
            log,
            ..Self::default()
        })
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn servers_for(&self, name: &str) -> Option<Vec<Url>> {
        self.services.lock().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl LoadBalancer for RecordingLoadBalancer {
    async fn upsert_service(
        &self,
        name: &str,
        servers: &[Url],
    ) -> Result<SharedHandler, ProxyError> {
        let joined: Vec<&str> = servers.iter().map(|u| u.as_str()).collect();
        self.log
            .record(format!("lb: upsert_service {} [{}]", name, joined.join(", ")));

        if self.fail.load(Ordering::SeqCst) {
            return Err(ProxyError::LoadBalancer("injected upsert failure".into()));
        }

        self.services
            .lock()
            .unwrap()
            .insert(name.into(), servers.to_vec());

        Ok(Arc::new(EchoHandler {
            service: name.into(),
        }))
    }
}
