use async_trait::async_trait;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, LOCATION};
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use std::sync::Arc;
use url::Url;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

/// A downstream request handler. The load balancer produces one per service;
/// the web servers capture them at `upsert_route` time, so the data plane
/// never re-enters the registry.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, req: Request<BoxBody>) -> Response<BoxBody>;
}

pub type SharedHandler = Arc<dyn RequestHandler>;

/// Fixed 404 handler. Lookups of unknown service names resolve to this
/// sentinel instead of an absent value, which collapses "not yet created",
/// "being reconfigured" and "permanently missing" into one uniform response.
pub struct NotFound;

#[async_trait]
impl RequestHandler for NotFound {
    async fn handle(&self, _req: Request<BoxBody>) -> Response<BoxBody> {
        response(StatusCode::NOT_FOUND, "not found")
    }
}

/// Fixed 500 handler installed under a service name when the load balancer
/// rejects the service. Keeps the registry from pointing at an obsolete
/// handler: frontends bound to the name fail loudly instead of silently
/// routing to the previous upstream set.
pub struct ServiceNotConfigured;

#[async_trait]
impl RequestHandler for ServiceNotConfigured {
    async fn handle(&self, _req: Request<BoxBody>) -> Response<BoxBody> {
        response(StatusCode::INTERNAL_SERVER_ERROR, "service not configured")
    }
}

/// Stateless permanent-redirect handler. The target is fixed at
/// construction: the secure frontend's URL in string form, path and query
/// included.
pub struct Redirect {
    location: Url,
}

impl Redirect {
    pub fn permanent(location: Url) -> Self {
        Self { location }
    }
}

#[async_trait]
impl RequestHandler for Redirect {
    async fn handle(&self, _req: Request<BoxBody>) -> Response<BoxBody> {
        Response::builder()
            .status(StatusCode::MOVED_PERMANENTLY)
            .header(LOCATION, self.location.as_str())
            .body(empty_body())
            .unwrap_or_else(|_| response(StatusCode::MOVED_PERMANENTLY, ""))
    }
}

fn response(status: StatusCode, body: &'static str) -> Response<BoxBody> {
    let mut resp = Response::new(full_body(body));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        CONTENT_TYPE,
        http::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    resp
}
