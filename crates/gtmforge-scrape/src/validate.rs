//! URL validation and normalization.
//!
//! Purely syntactic: a bare hostname gets an `http://` scheme, the scheme
//! must be http(s), and the host must contain a dot. Reachability is left to
//! the actual fetch.

use gtmforge_utils::error::ScrapeError;
use reqwest::Url;

/// Normalize and validate a website URL, returning the normalized form.
///
/// # Errors
///
/// Returns `ScrapeError::InvalidUrl` for unparsable URLs, non-http(s)
/// schemes, and hosts without a dot.
pub fn validate_url(url: &str) -> Result<String, ScrapeError> {
    let trimmed = url.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let parsed = Url::parse(&candidate).map_err(|e| ScrapeError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ScrapeError::InvalidUrl {
                url: url.to_string(),
                reason: format!("invalid URL scheme: {other}"),
            });
        }
    }

    let Some(host) = parsed.host_str() else {
        return Err(ScrapeError::InvalidUrl {
            url: url.to_string(),
            reason: "URL missing host".to_string(),
        });
    };

    if !host.contains('.') {
        return Err(ScrapeError::InvalidUrl {
            url: url.to_string(),
            reason: "URL host must contain a dot (e.g. example.com)".to_string(),
        });
    }

    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_hostname_gets_http_scheme() {
        let normalized = validate_url("example.com").unwrap();
        assert_eq!(normalized, "http://example.com/");
    }

    #[test]
    fn https_urls_pass_through() {
        let normalized = validate_url("https://example.com/about").unwrap();
        assert_eq!(normalized, "https://example.com/about");
    }

    #[test]
    fn rejects_non_http_schemes() {
        let err = validate_url("ftp://example.com").unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidUrl { ref reason, .. } if reason.contains("scheme")));
    }

    #[test]
    fn rejects_dotless_hosts() {
        let err = validate_url("http://localhost").unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidUrl { ref reason, .. } if reason.contains("dot")));
    }

    #[test]
    fn rejects_garbage() {
        assert!(validate_url("http://").is_err());
    }
}
