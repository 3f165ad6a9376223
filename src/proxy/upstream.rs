//! The outbound client seam.
//!
//! [`Upstream`] is the one capability the forwarder needs from an HTTP
//! client: send a request with a streaming body and hand back a response
//! whose body is still streaming. [`HyperUpstream`] implements it over
//! the pooled hyper client; tests substitute in-memory doubles.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use tower::ServiceExt;
use tower_http::decompression::Decompression;

use crate::error::BoxError;
use crate::server::HttpClient;

// async_trait is required here because Upstream is used as Arc<dyn Upstream>
// and native async fn in traits does not support dyn dispatch.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Send `request` and resolve once the response head has arrived.
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, BoxError>;
}

/// Upstream backed by the shared hyper client.
///
/// Responses pass through a decompression layer: compressed bodies are
/// decoded and lose their `content-encoding` and `content-length`, so the
/// relayed headers always describe the relayed bytes.
#[derive(Clone)]
pub struct HyperUpstream {
    client: Decompression<HttpClient>,
}

impl HyperUpstream {
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self {
            client: Decompression::new(client),
        }
    }
}

#[async_trait]
impl Upstream for HyperUpstream {
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, BoxError> {
        let response = self.client.clone().oneshot(request).await?;
        Ok(response.map(Body::new))
    }
}
