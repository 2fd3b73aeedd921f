use crate::domain::{Frontend, Service};
use crate::error::ProxyError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Read access to the frontend catalog. Listing yields names only;
/// describing fetches the full entity, so heavy certificate blobs are only
/// pulled for the frontends actually being reconciled.
#[async_trait]
pub trait FrontendRepository: Send + Sync {
    async fn list_frontends(&self) -> Result<Vec<String>, ProxyError>;

    /// Returns the frontend with the given name, or
    /// `ProxyError::UnknownFrontend` if no such frontend exists.
    async fn describe_frontend(&self, name: &str) -> Result<Frontend, ProxyError>;
}

/// Read access to the service catalog.
#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn list_services(&self) -> Result<Vec<String>, ProxyError>;

    /// Returns the service with the given name, or
    /// `ProxyError::UnknownService` if no such service exists.
    async fn describe_service(&self, name: &str) -> Result<Service, ProxyError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendEvent {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEvent {
    pub name: String,
}

/// Optional push capability complementing `FrontendRepository`. The
/// subscriber hands over a bounded sender; the watcher must not assume the
/// receiving side stays open: a failed send means the loop has exited and
/// is a benign drop.
pub trait FrontendWatcher: Send + Sync {
    fn subscribe(&self, events: mpsc::Sender<FrontendEvent>);
}

/// Optional push capability complementing `ServiceRepository`.
pub trait ServiceWatcher: Send + Sync {
    fn subscribe(&self, events: mpsc::Sender<ServiceEvent>);
}
