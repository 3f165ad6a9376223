//! `relay run`: start the proxy server.
//!
//! Resolves the upstream settings once, builds the shared forwarder and
//! serves the Axum router until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::cli::RunArgs;
use crate::config::ProxyConfig;
use crate::error::RelayError;
use crate::logging;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), RelayError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let config = ProxyConfig::resolve(&args.proxy)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        upstream = %config.upstream,
        prefix = %config.display_prefix(),
        fallback = config.fallback,
        timeout = ?config.timeout,
        "relay started"
    );

    let state = Arc::new(AppState::new(config));
    let router = server::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("relay stopped");
    Ok(())
}
