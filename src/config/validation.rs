//! Validation of the upstream base URL and inbound prefix.
//!
//! Each check returns a [`ValidationError`] with a per-field suggestion
//! so `relay validate` and startup can report every problem at once.

use url::Url;

use crate::error::ValidationError;

const PREFIX_FORBIDDEN: &[char] = &['{', '}', '*', '?', '#'];

/// Validate the upstream base URL.
///
/// The base is concatenated verbatim with `/` and the forwarded path, so
/// it must be absolute, `http` or `https`, and end without a slash.
pub fn validate_upstream(url: &str) -> Result<(), ValidationError> {
    let error = |message: String, suggestion: Option<String>| ValidationError {
        field: "target_url".into(),
        message,
        suggestion,
    };

    let parsed = Url::parse(url).map_err(|_| {
        let suggestion = (!url.contains("://") && !url.contains(' '))
            .then(|| format!("did you mean 'http://{url}'?"));
        error(format!("'{url}' is not a valid URL"), suggestion)
    })?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(error(
            format!("unsupported scheme '{scheme}' (expected http or https)"),
            None,
        ));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(error(format!("'{url}' has no host"), None));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(error(
            "must not contain a query string or fragment".into(),
            None,
        ));
    }
    if url.ends_with('/') {
        return Err(error(
            "must not end with '/'".into(),
            Some(format!("did you mean '{}'?", url.trim_end_matches('/'))),
        ));
    }
    Ok(())
}

/// Validate the inbound path prefix.
pub fn validate_prefix(prefix: &str) -> Result<(), ValidationError> {
    let error = |message: String, suggestion: Option<String>| ValidationError {
        field: "prefix".into(),
        message,
        suggestion,
    };

    if prefix.is_empty() {
        return Err(error(
            "prefix cannot be empty".into(),
            Some("use '/' to forward every path".into()),
        ));
    }
    if !prefix.starts_with('/') {
        return Err(error(
            "prefix must start with '/'".into(),
            Some(format!("did you mean '/{prefix}'?")),
        ));
    }
    if let Some(c) = prefix.chars().find(|c| PREFIX_FORBIDDEN.contains(c)) {
        return Err(error(format!("prefix must not contain '{c}'"), None));
    }
    Ok(())
}

/// Strip trailing slashes; the root prefix `/` becomes the empty string.
#[must_use]
pub fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_end_matches('/').to_string()
}
