//! URL resolution for manifest entries and fallback documents.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a path or absolute URL against `base`.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Absolute URLs are parsed as-is, anything else is joined onto `base`
/// 3. Only http and https are accepted
/// 4. Lowercase the host
/// 5. Remove fragment (#...)
/// 6. Keep query string intact (do not reorder)
pub fn resolve(base: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = if trimmed.contains("://") { Url::parse(trimmed) } else { base.join(trimmed) }
        .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let host = host.to_lowercase();
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://app.test/").unwrap()
    }

    #[test]
    fn test_resolve_path() {
        let url = resolve(&base(), "/offline.html").unwrap();
        assert_eq!(url.as_str(), "https://app.test/offline.html");
    }

    #[test]
    fn test_resolve_relative_to_nested_base() {
        let base = Url::parse("https://app.test/app/").unwrap();
        assert_eq!(resolve(&base, "main.js").unwrap().as_str(), "https://app.test/app/main.js");
        assert_eq!(resolve(&base, "/main.js").unwrap().as_str(), "https://app.test/main.js");
    }

    #[test]
    fn test_resolve_absolute_keeps_origin() {
        let url = resolve(&base(), "https://FONTS.gstatic.com/s/font.woff2").unwrap();
        assert_eq!(url.host_str(), Some("fonts.gstatic.com"));
    }

    #[test]
    fn test_resolve_remove_fragment() {
        let url = resolve(&base(), "/index.html#section").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/index.html");
    }

    #[test]
    fn test_resolve_preserve_query() {
        let url = resolve(&base(), "/data/items?a=1&b=2").unwrap();
        assert_eq!(url.query(), Some("a=1&b=2"));
    }

    #[test]
    fn test_resolve_trim_whitespace() {
        let url = resolve(&base(), "  /  ").unwrap();
        assert_eq!(url.as_str(), "https://app.test/");
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let result = resolve(&base(), "chrome-extension://abc/script.js");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&base(), ""), Err(UrlError::Empty)));
        assert!(matches!(resolve(&base(), "   "), Err(UrlError::Empty)));
    }
}
