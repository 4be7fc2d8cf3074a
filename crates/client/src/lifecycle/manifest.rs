//! Precache manifest resolution.

use swcache_core::{AppConfig, Error};
use url::Url;

use crate::fetch::resolve;

/// Absolute URLs that must be resident before a generation may activate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecacheManifest {
    urls: Vec<Url>,
}

impl PrecacheManifest {
    /// Resolve manifest entries against `base`.
    ///
    /// Duplicates are dropped, keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` for an entry that is empty, unparsable or
    /// not http(s).
    pub fn resolve(base: &Url, entries: &[String]) -> Result<Self, Error> {
        let mut urls: Vec<Url> = Vec::with_capacity(entries.len());
        for entry in entries {
            let url = resolve(base, entry).map_err(|e| Error::InvalidUrl(format!("precache entry {entry:?}: {e}")))?;
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        Ok(Self { urls })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let base = config.base_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Self::resolve(&base, &config.precache)
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://app.test/").unwrap()
    }

    #[test]
    fn test_resolve_paths_and_urls() {
        let entries = vec!["/".to_string(), "/app.js".to_string(), "https://cdn.jsdelivr.net/lib.js".to_string()];
        let manifest = PrecacheManifest::resolve(&base(), &entries).unwrap();
        let urls: Vec<&str> = manifest.urls().iter().map(Url::as_str).collect();
        assert_eq!(urls, vec!["https://app.test/", "https://app.test/app.js", "https://cdn.jsdelivr.net/lib.js"]);
    }

    #[test]
    fn test_dedupes_preserving_order() {
        let entries = vec!["/b.js".to_string(), "/a.js".to_string(), "/b.js#top".to_string()];
        let manifest = PrecacheManifest::resolve(&base(), &entries).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.urls()[0].path(), "/b.js");
        assert_eq!(manifest.urls()[1].path(), "/a.js");
    }

    #[test]
    fn test_rejects_foreign_scheme() {
        let entries = vec!["chrome-extension://abc/x.js".to_string()];
        let result = PrecacheManifest::resolve(&base(), &entries);
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_from_default_config() {
        let manifest = PrecacheManifest::from_config(&AppConfig::default()).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.urls()[1].as_str(), "http://localhost:8080/offline.html");
        assert!(!manifest.is_empty());
    }
}
