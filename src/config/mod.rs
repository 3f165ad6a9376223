//! Proxy configuration resolution.
//!
//! [`ProxyConfig`] is resolved once at startup from CLI flags and their
//! environment variable equivalents, validated, and then shared
//! read-only (behind an `Arc`) by every request. When no upstream is
//! configured the [`DEFAULT_UPSTREAM`] fallback is used and a warning is
//! logged.

pub mod validation;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::ProxyArgs;
use crate::error::RelayError;

/// Upstream used when `TARGET_SERVER_URL` is absent. Local development only.
pub const DEFAULT_UPSTREAM: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Upstream base URL, concatenated verbatim with the forwarded path.
    pub upstream: String,
    /// Normalized inbound prefix without trailing slash; empty means root.
    pub prefix: String,
    /// Bound on the wait for upstream response headers.
    pub timeout: Option<Duration>,
    /// Whether [`DEFAULT_UPSTREAM`] was substituted for a missing setting.
    pub fallback: bool,
}

/// Serializable view used by `/health` and `relay validate --format json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxySummary {
    pub url: String,
    pub prefix: String,
    pub fallback: bool,
    pub timeout_ms: Option<u64>,
}

impl ProxyConfig {
    /// Resolve and validate settings. All problems are reported at once.
    pub fn resolve(args: &ProxyArgs) -> Result<Self, RelayError> {
        let configured = args
            .target_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let (upstream, fallback) = match configured {
            Some(url) => (url.to_string(), false),
            None => {
                tracing::warn!(
                    upstream = DEFAULT_UPSTREAM,
                    "TARGET_SERVER_URL not set, falling back to default upstream"
                );
                (DEFAULT_UPSTREAM.to_string(), true)
            }
        };

        let mut errors = Vec::new();
        if let Err(e) = validation::validate_upstream(&upstream) {
            errors.push(e);
        }
        if let Err(e) = validation::validate_prefix(&args.prefix) {
            errors.push(e);
        }
        if !errors.is_empty() {
            return Err(RelayError::ConfigValidation { errors });
        }

        Ok(Self {
            upstream,
            prefix: validation::normalize_prefix(&args.prefix),
            timeout: (args.timeout > 0).then(|| Duration::from_millis(args.timeout)),
            fallback,
        })
    }

    /// The prefix as it appears in URLs (`/` for the root prefix).
    #[must_use]
    pub fn display_prefix(&self) -> &str {
        if self.prefix.is_empty() {
            "/"
        } else {
            &self.prefix
        }
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn summary(&self) -> ProxySummary {
        ProxySummary {
            url: self.upstream.clone(),
            prefix: self.display_prefix().to_string(),
            fallback: self.fallback,
            timeout_ms: self.timeout.map(|d| d.as_millis() as u64),
        }
    }
}
