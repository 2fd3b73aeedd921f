mod collaborators;
mod repositories;

pub use collaborators::{LoadBalancer, SecureWebServer, WebServer};
pub use repositories::{
    FrontendEvent, FrontendRepository, FrontendWatcher, ServiceEvent, ServiceRepository,
    ServiceWatcher,
};
