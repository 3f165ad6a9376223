//! Core HTTP forwarding handler.
//!
//! The [`forward_handler`] function is the Axum fallback that receives
//! every non-`/health` request, checks it against the configured prefix,
//! and hands it to the [`Forwarder`]. Submodules handle prefix matching
//! and URL construction ([`routing`]), header filtering ([`headers`]),
//! the outbound client seam ([`upstream`]) and the pass-through itself
//! ([`forward`]).

pub mod forward;
pub mod headers;
pub mod routing;
pub mod upstream;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub use forward::{Forwarder, ProxyErrorBody, Stats};
pub use upstream::{HyperUpstream, Upstream};

use crate::server::AppState;

pub async fn forward_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let forwarder = &state.forwarder;

    let Some(suffix) =
        routing::match_prefix(request.uri().path(), &forwarder.config().prefix).map(String::from)
    else {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "path outside proxy prefix"
        );
        return StatusCode::NOT_FOUND.into_response();
    };

    forwarder.forward(request, &suffix).await
}
