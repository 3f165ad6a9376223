//! Relay is a single-route HTTP forwarding proxy.
//!
//! Every request under a fixed path prefix (default `/proxy`) is
//! forwarded to `TARGET_SERVER_URL` with the path suffix and query string
//! appended verbatim. Method, headers (minus `host`) and body go up;
//! status, headers (minus `content-encoding` and `transfer-encoding`) and
//! body come back. Bodies stream in both directions. Any upstream failure
//! becomes a `502` with a JSON `{message, error}` body.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, validate, health).
//! - [`config`] -- Resolution and validation of the upstream settings.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`health`] -- `GET /health` endpoint handler returning runtime diagnostics.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`proxy`] -- Core forwarding: prefix matching, URL construction,
//!   header filtering, and the streaming pass-through.
//! - [`server`] -- Axum server setup, shared application state, HTTP client, and
//!   graceful shutdown.

// Binary crate: public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod proxy;
pub mod server;
