use std::fmt;

/// Crate-wide error type. Construction-time variants are returned
/// synchronously from the command and query factories; the runtime variants
/// travel through the repository and collaborator contracts and are logged
/// by the reconciliation loop rather than surfaced to the caller.
#[derive(Debug)]
pub enum ProxyError {
    UnknownFrontend(String),
    UnknownService(String),
    FrontendRepositoryMissing,
    ServiceRepositoryMissing,
    FrontendWatcherMissing,
    ServiceWatcherMissing,
    WebServersMissing,
    LoadBalancerMissing,
    InvalidFrontend(String),
    InvalidService(String),
    Repository(String),
    WebServer(String),
    LoadBalancer(String),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::UnknownFrontend(name) => write!(f, "unknown frontend: {}", name),
            ProxyError::UnknownService(name) => write!(f, "unknown service: {}", name),
            ProxyError::FrontendRepositoryMissing => write!(f, "frontend repository missing"),
            ProxyError::ServiceRepositoryMissing => write!(f, "service repository missing"),
            ProxyError::FrontendWatcherMissing => write!(f, "frontend watcher missing"),
            ProxyError::ServiceWatcherMissing => write!(f, "service watcher missing"),
            ProxyError::WebServersMissing => write!(f, "web servers missing"),
            ProxyError::LoadBalancerMissing => write!(f, "load balancer missing"),
            ProxyError::InvalidFrontend(msg) => write!(f, "invalid frontend: {}", msg),
            ProxyError::InvalidService(msg) => write!(f, "invalid service: {}", msg),
            ProxyError::Repository(msg) => write!(f, "repository error: {}", msg),
            ProxyError::WebServer(msg) => write!(f, "web server error: {}", msg),
            ProxyError::LoadBalancer(msg) => write!(f, "load balancer error: {}", msg),
        }
    }
}

impl std::error::Error for ProxyError {}
