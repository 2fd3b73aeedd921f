use crate::handlers::{NotFound, SharedHandler};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Process-local mapping from service name to request handler.
///
/// One mutex guards the map, and the reconciler holds it across its
/// collaborator calls: a concurrent service reconcile can therefore never
/// install a newer handler between a frontend's lookup and its route
/// upsert. The lock surfaces as a guard so lookup and upsert share a single
/// critical section.
pub struct ServiceHandlers {
    not_found: SharedHandler,
    inner: Mutex<HashMap<String, SharedHandler>>,
}

impl ServiceHandlers {
    pub fn new() -> Self {
        Self {
            not_found: Arc::new(NotFound),
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub async fn lock(&self) -> ServiceHandlersGuard<'_> {
        ServiceHandlersGuard {
            not_found: &self.not_found,
            inner: self.inner.lock().await,
        }
    }
}

impl Default for ServiceHandlers {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ServiceHandlersGuard<'a> {
    not_found: &'a SharedHandler,
    inner: MutexGuard<'a, HashMap<String, SharedHandler>>,
}

impl ServiceHandlersGuard<'_> {
    /// Returns the handler stored under `name`, or the shared not-found
    /// sentinel. Never an absent value: unknown names serve 404 downstream.
    pub fn get(&self, name: &str) -> SharedHandler {
        self.inner
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.not_found.clone())
    }

    /// Replaces any prior binding under `name`.
    pub fn set(&mut self, name: impl Into<String>, handler: SharedHandler) {
        self.inner.insert(name.into(), handler);
    }
}
