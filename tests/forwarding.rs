//! End-to-end forwarding tests against a live echo upstream.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;

use relay::config::ProxyConfig;
use relay::health::HealthResponse;
use relay::proxy::ProxyErrorBody;
use relay::server::{self, AppState};

/// What the echo upstream saw.
#[derive(Debug, Serialize, Deserialize)]
struct Echo {
    method: String,
    uri: String,
    headers: BTreeMap<String, Vec<String>>,
    body: String,
}

async fn echo(request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in &parts.headers {
        headers
            .entry(name.to_string())
            .or_default()
            .push(value.to_str().unwrap_or_default().to_string());
    }

    let seen = Echo {
        method: parts.method.to_string(),
        uri: parts.uri.to_string(),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    };

    (
        [
            ("x-upstream", "echo"),
            ("x-echo-method", parts.method.as_str()),
            ("content-encoding", "identity"),
        ],
        Json(seen),
    )
        .into_response()
}

async fn teapot() -> impl IntoResponse {
    (StatusCode::IM_A_TEAPOT, [("x-upstream", "teapot")], "short and stout")
}

async fn spawn(router: Router) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    (addr, shutdown_tx)
}

struct Harness {
    proxy: SocketAddr,
    upstream: SocketAddr,
    _shutdown: Vec<tokio::sync::oneshot::Sender<()>>,
}

impl Harness {
    async fn start() -> Self {
        let upstream_router = Router::new()
            .route("/teapot", any(teapot))
            .fallback(echo);
        let (upstream, upstream_shutdown) = spawn(upstream_router).await;

        let (proxy, proxy_shutdown) = start_proxy(format!("http://{upstream}")).await;

        Self {
            proxy,
            upstream,
            _shutdown: vec![upstream_shutdown, proxy_shutdown],
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.proxy)
    }
}

async fn start_proxy(upstream: String) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let config = ProxyConfig {
        upstream,
        prefix: "/proxy".into(),
        timeout: Some(Duration::from_secs(5)),
        fallback: false,
    };
    spawn(server::build_router(Arc::new(AppState::new(config)))).await
}

#[tokio::test]
async fn get_reaches_upstream_with_path_and_query() {
    let h = Harness::start().await;

    let resp = reqwest::Client::new()
        .get(h.url("/proxy/users/123?active=true"))
        .header("x-custom", "kept")
        .header("authorization", "Bearer abc")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["x-upstream"], "echo");
    assert!(resp.headers().get("content-encoding").is_none());

    let seen: Echo = resp.json().await.unwrap();
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.uri, "/users/123?active=true");
    assert_eq!(seen.headers["x-custom"], ["kept"]);
    assert_eq!(seen.headers["authorization"], ["Bearer abc"]);
    // Host is recomputed from the target, never copied from the inbound request.
    assert_eq!(seen.headers["host"], [h.upstream.to_string()]);
}

#[tokio::test]
async fn query_and_encoded_path_are_byte_exact() {
    let h = Harness::start().await;

    let seen: Echo = reqwest::get(h.url("/proxy/items/a%20b/c%2Fd?x=1&y=2&x=%26"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(seen.uri, "/items/a%20b/c%2Fd?x=1&y=2&x=%26");
}

#[tokio::test]
async fn prefix_alone_targets_upstream_root() {
    let h = Harness::start().await;

    let seen: Echo = reqwest::get(h.url("/proxy")).await.unwrap().json().await.unwrap();
    assert_eq!(seen.uri, "/");
}

#[tokio::test]
async fn post_body_arrives_unchanged() {
    let h = Harness::start().await;

    let resp = reqwest::Client::new()
        .post(h.url("/proxy/orders"))
        .header("content-type", "application/json")
        .body(r#"{"sku":"A1"}"#)
        .send()
        .await
        .unwrap();
    let seen: Echo = resp.json().await.unwrap();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.uri, "/orders");
    assert_eq!(seen.body, r#"{"sku":"A1"}"#);
    assert_eq!(seen.headers["content-type"], ["application/json"]);
}

#[tokio::test]
async fn large_body_streams_through() {
    let h = Harness::start().await;
    let payload = "x".repeat(4 * 1024 * 1024);

    let seen: Echo = reqwest::Client::new()
        .put(h.url("/proxy/blob"))
        .body(payload.clone())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(seen.method, "PUT");
    assert_eq!(seen.body.len(), payload.len());
}

#[tokio::test]
async fn get_body_is_not_forwarded() {
    let h = Harness::start().await;

    let seen: Echo = reqwest::Client::new()
        .get(h.url("/proxy/search"))
        .body("should not arrive")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(seen.method, "GET");
    assert!(seen.body.is_empty());
    assert!(!seen.headers.contains_key("content-length"));
}

#[tokio::test]
async fn all_supported_methods_are_forwarded() {
    let h = Harness::start().await;
    let client = reqwest::Client::new();

    for method in ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"] {
        let method = reqwest::Method::from_bytes(method.as_bytes()).unwrap();
        let resp = client
            .request(method.clone(), h.url("/proxy/things/7"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200, "{method}");
        assert_eq!(resp.headers()["x-echo-method"], method.as_str());
    }
}

#[tokio::test]
async fn upstream_status_and_headers_are_relayed() {
    let h = Harness::start().await;

    let resp = reqwest::get(h.url("/proxy/teapot")).await.unwrap();
    assert_eq!(resp.status(), 418);
    assert_eq!(resp.headers()["x-upstream"], "teapot");
    assert_eq!(resp.text().await.unwrap(), "short and stout");
}

#[tokio::test]
async fn unreachable_upstream_returns_502() {
    // Bind and immediately release a port so nothing is listening on it.
    let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = dead.local_addr().unwrap();
    drop(dead);

    let (proxy, _shutdown) = start_proxy(format!("http://{dead_addr}")).await;

    let resp = reqwest::get(format!("http://{proxy}/proxy/users/1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    assert_eq!(resp.headers()["content-type"], "application/json");

    let body: ProxyErrorBody = resp.json().await.unwrap();
    assert_eq!(body.message, "Proxy error");
    assert!(!body.error.is_empty());

    let health: HealthResponse = reqwest::get(format!("http://{proxy}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health.stats.requests_failed, 1);
    assert_eq!(health.stats.requests_forwarded, 0);
}

#[tokio::test]
async fn repeated_get_is_independent() {
    let h = Harness::start().await;

    let mut bodies = Vec::new();
    for _ in 0..2 {
        let resp = reqwest::get(h.url("/proxy/users/123?active=true"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let seen: Echo = resp.json().await.unwrap();
        bodies.push((seen.method, seen.uri, seen.body));
    }
    assert_eq!(bodies[0], bodies[1]);
}

const GREETING: &str = "hello gzip world, repeated until the body is worth compressing";

#[tokio::test]
async fn gzip_upstream_body_is_decoded() {
    let upstream_router = Router::new()
        .route("/greeting", any(|| async { GREETING }))
        .route(
            "/empty",
            any(|| async { (StatusCode::NO_CONTENT, [("content-encoding", "gzip")]) }),
        )
        .layer(CompressionLayer::new());
    let (upstream, _upstream_shutdown) = spawn(upstream_router).await;
    let (proxy, _proxy_shutdown) = start_proxy(format!("http://{upstream}")).await;
    let client = reqwest::Client::new();

    // Without the gzip feature reqwest leaves the encoded body alone.
    let direct = client
        .get(format!("http://{upstream}/greeting"))
        .header("accept-encoding", "gzip")
        .send()
        .await
        .unwrap();
    assert_eq!(direct.headers()["content-encoding"], "gzip");
    assert_ne!(direct.bytes().await.unwrap().as_ref(), GREETING.as_bytes());

    let resp = client
        .get(format!("http://{proxy}/proxy/greeting"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers().get("content-encoding").is_none());
    assert_eq!(resp.text().await.unwrap(), GREETING);

    let head = client
        .head(format!("http://{proxy}/proxy/greeting"))
        .send()
        .await
        .unwrap();
    assert_eq!(head.status(), 200);
    assert!(head.headers().get("content-encoding").is_none());
    assert!(head.bytes().await.unwrap().is_empty());

    let empty = client
        .get(format!("http://{proxy}/proxy/empty"))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), 204);
    assert!(empty.headers().get("content-encoding").is_none());
    assert!(empty.bytes().await.unwrap().is_empty());
}

/// Flips its flag when the owning handler future is dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn client_disconnect_drops_upstream_call() {
    let dropped = Arc::new(AtomicBool::new(false));
    let flag = dropped.clone();
    let upstream_router = Router::new().route(
        "/slow",
        any(move || {
            let flag = flag.clone();
            async move {
                let _guard = DropFlag(flag);
                tokio::time::sleep(Duration::from_secs(10)).await;
                "too late"
            }
        }),
    );
    let (upstream, _upstream_shutdown) = spawn(upstream_router).await;
    let (proxy, _proxy_shutdown) = start_proxy(format!("http://{upstream}")).await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let result = client
        .get(format!("http://{proxy}/proxy/slow"))
        .send()
        .await;
    assert!(result.unwrap_err().is_timeout());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(dropped.load(Ordering::SeqCst));
}
