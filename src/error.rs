//! Unified error types for relay.
//!
//! Defines [`RelayError`] (the main crate error enum) and
//! [`ValidationError`] for configuration problems found at startup.
//! Both use `thiserror`-style `Display` output with hints that point
//! the operator toward a fix.

use std::time::Duration;

/// Boxed error used at the outbound client seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RelayError {
    #[error("Config validation failed:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI '{uri}': {source}")]
    UriParse {
        uri: String,
        #[source]
        source: BoxError,
    },

    #[error("HTTP request failed: {}", describe(.source.as_ref()))]
    HttpRequest {
        #[source]
        source: BoxError,
    },

    #[error("upstream did not respond within {}ms", .0.as_millis())]
    UpstreamTimeout(Duration),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),
}

/// Render an error together with its `source()` chain, outermost first.
///
/// Client errors from hyper only name their category at the top level
/// ("client error (Connect)"); the useful detail such as "Connection
/// refused" lives further down the chain.
#[must_use]
pub fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(inner) = current {
        let msg = inner.to_string();
        if !out.contains(&msg) {
            out.push_str(": ");
            out.push_str(&msg);
        }
        current = inner.source();
    }
    out
}
