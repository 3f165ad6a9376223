//! The request/response pass-through.
//!
//! [`Forwarder::forward`] turns one inbound request into one upstream
//! request, and the upstream response (or failure) into exactly one
//! client response. Bodies stream in both directions. Nothing is
//! spawned: the upstream exchange lives inside the caller's future, so
//! a client that disconnects drops the pending upstream call with it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::config::ProxyConfig;
use crate::error::RelayError;

use super::headers;
use super::routing::build_target_url;
use super::upstream::Upstream;

/// JSON body returned with `502 Bad Gateway` when the upstream exchange fails.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProxyErrorBody {
    pub message: String,
    pub error: String,
}

#[derive(Debug)]
pub struct Stats {
    pub forwarded: AtomicU64,
    pub failed: AtomicU64,
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            forwarded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }
}

pub struct Forwarder {
    upstream: Arc<dyn Upstream>,
    config: Arc<ProxyConfig>,
    stats: Stats,
}

impl Forwarder {
    #[must_use]
    pub fn new(upstream: Arc<dyn Upstream>, config: Arc<ProxyConfig>) -> Self {
        Self {
            upstream,
            config,
            stats: Stats::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    #[must_use]
    pub const fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Forward `request` to `upstream + "/" + suffix + query`.
    ///
    /// `suffix` is the raw path after the proxy prefix. Always produces a
    /// response: upstream failures become `502` with a [`ProxyErrorBody`].
    pub async fn forward(&self, request: Request<Body>, suffix: &str) -> Response<Body> {
        let correlation_id = request
            .headers()
            .get("x-correlation-id")
            .and_then(|v| v.to_str().ok())
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

        match self.try_forward(request, suffix, &correlation_id).await {
            Ok(response) => {
                self.stats.forwarded.fetch_add(1, Ordering::Relaxed);
                response
            }
            Err(e) => {
                tracing::error!(
                    correlation_id = %correlation_id,
                    error = %e,
                    "proxy error"
                );
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                proxy_error(&e)
            }
        }
    }

    async fn try_forward(
        &self,
        request: Request<Body>,
        suffix: &str,
        correlation_id: &str,
    ) -> Result<Response<Body>, RelayError> {
        let (parts, body) = request.into_parts();

        let target = build_target_url(&self.config.upstream, suffix, parts.uri.query());
        let uri: Uri = target
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| RelayError::UriParse {
                uri: target.clone(),
                source: Box::new(e),
            })?;

        let with_body = headers::carries_body(&parts.method);
        let body = if with_body { body } else { Body::empty() };

        let mut outbound = Request::builder()
            .method(parts.method.clone())
            .uri(uri)
            .body(body)
            .map_err(|e| RelayError::HttpRequest {
                source: Box::new(e),
            })?;
        *outbound.headers_mut() = headers::outbound_headers(&parts.headers, with_body);

        tracing::info!(
            correlation_id = %correlation_id,
            method = %parts.method,
            target = %target,
            "forwarding request"
        );

        let pending = self.upstream.send(outbound);
        let result = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| RelayError::UpstreamTimeout(limit))?,
            None => pending.await,
        };
        let upstream_response = result.map_err(|source| RelayError::HttpRequest { source })?;

        let (upstream_parts, upstream_body) = upstream_response.into_parts();
        tracing::info!(
            correlation_id = %correlation_id,
            status = upstream_parts.status.as_u16(),
            "upstream responded"
        );

        let mut response_headers = upstream_parts.headers;
        headers::strip_response_headers(&mut response_headers);

        let mut response = Response::new(upstream_body);
        *response.status_mut() = upstream_parts.status;
        *response.headers_mut() = response_headers;
        Ok(response)
    }
}

fn proxy_error(error: &RelayError) -> Response<Body> {
    let body = ProxyErrorBody {
        message: "Proxy error".into(),
        error: error.to_string(),
    };
    (StatusCode::BAD_GATEWAY, Json(body)).into_response()
}
