//! Prefix matching and target URL construction.
//!
//! [`match_prefix`] decides whether an inbound path belongs to the proxy
//! and returns the raw path suffix after the prefix. [`build_target_url`]
//! joins that suffix and the raw query string onto the upstream base.
//! Neither function decodes or re-encodes anything: percent-escapes,
//! empty segments and query bytes are carried through as received.

/// Return the path suffix after `prefix`, without its leading `/`.
///
/// `prefix` is normalized (no trailing slash, empty for root). The match
/// is on a segment boundary, so `/proxy` matches `/proxy` and
/// `/proxy/a` but not `/proxyfoo`.
#[must_use]
pub fn match_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        return Some("");
    }
    rest.strip_prefix('/')
}

/// `upstream + "/" + suffix`, plus `"?" + query` when the query is non-empty.
#[must_use]
pub fn build_target_url(upstream: &str, suffix: &str, query: Option<&str>) -> String {
    let mut url = String::with_capacity(upstream.len() + suffix.len() + 2);
    url.push_str(upstream);
    url.push('/');
    url.push_str(suffix);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    url
}
