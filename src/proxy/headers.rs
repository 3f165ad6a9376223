//! Header filtering in both directions.
//!
//! Outbound, every inbound header is copied except `host`, which the
//! client recomputes from the target URL. Inbound, the upstream's
//! `content-encoding` and `transfer-encoding` are dropped because the
//! body is re-framed (and, when compressed, decoded) on its way back.

use axum::http::header::{CONTENT_ENCODING, CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use axum::http::{HeaderMap, Method};

/// Whether the inbound body is sent upstream for this method.
#[must_use]
pub fn carries_body(method: &Method) -> bool {
    !(method == Method::GET || method == Method::HEAD)
}

/// Build the upstream request headers.
///
/// When no body is sent, inbound body framing (`content-length`,
/// `transfer-encoding`) is dropped too, otherwise the upstream would wait
/// for bytes that never arrive.
#[must_use]
pub fn outbound_headers(original: &HeaderMap, with_body: bool) -> HeaderMap {
    let mut headers = original.clone();
    headers.remove(HOST);
    if !with_body {
        headers.remove(CONTENT_LENGTH);
        headers.remove(TRANSFER_ENCODING);
    }
    headers
}

/// Remove upstream body framing headers before relaying a response.
pub fn strip_response_headers(headers: &mut HeaderMap) {
    headers.remove(CONTENT_ENCODING);
    headers.remove(TRANSFER_ENCODING);
}
