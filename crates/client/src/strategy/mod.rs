//! Caching strategies.
//!
//! | class                        | strategy                 |
//! |------------------------------|--------------------------|
//! | data asset, external asset   | cache-first              |
//! | static asset                 | stale-while-revalidate   |
//! | document                     | network-first            |
//!
//! Every strategy resolves to a response: transport failures fall back to
//! the cache or to the synthetic 503, and store failures degrade to
//! network-only behavior with a warning.

mod background;
mod cache_first;
mod network_first;
mod stale_while_revalidate;

pub use background::RevalidationStats;

use std::sync::Arc;

use serde::Serialize;
use swcache_core::{AppConfig, CacheDb, GenerationHandle, Request, RequestIdentity, Response};

use crate::fetch::Fetcher;
use crate::lifecycle::ActiveGeneration;
use crate::router::RouteClass;
use background::Background;

/// One of the three caching algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

impl Strategy {
    pub fn for_class(class: RouteClass) -> Self {
        match class {
            RouteClass::DataAsset | RouteClass::ExternalAsset => Strategy::CacheFirst,
            RouteClass::StaticAsset => Strategy::StaleWhileRevalidate,
            RouteClass::Document => Strategy::NetworkFirst,
        }
    }
}

/// Where a returned response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Cache,
    Network,
    OfflineDocument,
    RootDocument,
    Synthetic,
}

/// A response plus its provenance.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub source: Source,
}

impl Served {
    fn new(response: Response, source: Source) -> Self {
        Self { response, source }
    }

    fn offline() -> Self {
        Self::new(Response::offline(), Source::Synthetic)
    }
}

/// Which transport-successful responses are written to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePolicy {
    /// Any status, including 4xx/5xx.
    AnyStatus,
    /// 2xx only.
    SuccessOnly,
}

impl StorePolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        if config.cache_error_responses { StorePolicy::AnyStatus } else { StorePolicy::SuccessOnly }
    }

    pub fn should_store(&self, response: &Response) -> bool {
        match self {
            StorePolicy::AnyStatus => true,
            StorePolicy::SuccessOnly => response.is_success(),
        }
    }
}

/// Navigation fallbacks, tried in order after a cache miss.
#[derive(Debug, Clone)]
pub struct Fallbacks {
    pub offline_document: String,
    pub root_document: String,
}

impl Fallbacks {
    pub fn from_config(config: &AppConfig) -> Self {
        Self { offline_document: config.offline_document.clone(), root_document: config.root_document.clone() }
    }
}

/// Runs strategies against the active generation and the network.
pub struct StrategyEngine {
    db: CacheDb,
    network: Arc<dyn Fetcher>,
    active: ActiveGeneration,
    fallbacks: Fallbacks,
    policy: StorePolicy,
    background: Background,
}

impl StrategyEngine {
    pub fn new(
        db: CacheDb, network: Arc<dyn Fetcher>, active: ActiveGeneration, fallbacks: Fallbacks, policy: StorePolicy,
    ) -> Self {
        Self { db, network, active, fallbacks, policy, background: Background::default() }
    }

    /// Resolve a request with the given strategy.
    pub async fn run(&self, strategy: Strategy, request: &Request) -> Served {
        match strategy {
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
        }
    }

    /// Counters for background revalidation.
    pub fn revalidation_stats(&self) -> RevalidationStats {
        self.background.stats()
    }

    /// Wait for every detached revalidation to finish.
    pub async fn settle(&self) {
        self.background.settle().await;
    }

    async fn lookup(&self, generation: Option<&GenerationHandle>, identity: &RequestIdentity) -> Option<Response> {
        lookup(&self.db, generation, identity).await
    }

    async fn store(&self, generation: Option<&GenerationHandle>, identity: &RequestIdentity, response: &Response) {
        store(&self.db, self.policy, generation, identity, response).await;
    }
}

/// Cache read that treats store failures as a miss.
async fn lookup(db: &CacheDb, generation: Option<&GenerationHandle>, identity: &RequestIdentity) -> Option<Response> {
    let generation = generation?;
    match db.match_entry(generation, identity).await {
        Ok(Some(entry)) => {
            tracing::debug!(url = %identity.url, generation = generation.name(), "cache hit");
            Some(entry.response)
        }
        Ok(None) => {
            tracing::debug!(url = %identity.url, generation = generation.name(), "cache miss");
            None
        }
        Err(e) => {
            tracing::warn!(url = %identity.url, error = %e, "cache read failed; treating as miss");
            None
        }
    }
}

/// Cache write that never fails the caller.
async fn store(
    db: &CacheDb, policy: StorePolicy, generation: Option<&GenerationHandle>, identity: &RequestIdentity,
    response: &Response,
) {
    let Some(generation) = generation else {
        tracing::debug!(url = %identity.url, "no active generation; response not cached");
        return;
    };
    if !policy.should_store(response) {
        tracing::debug!(url = %identity.url, status = response.status, "status not cacheable under policy");
        return;
    }
    match db.put_entry(generation, identity, response).await {
        Ok(true) => tracing::debug!(url = %identity.url, generation = generation.name(), "cached response"),
        Ok(false) => tracing::debug!(url = %identity.url, generation = generation.name(), "generation gone; write dropped"),
        Err(e) => tracing::warn!(url = %identity.url, error = %e, "cache write failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_for_class() {
        assert_eq!(Strategy::for_class(RouteClass::DataAsset), Strategy::CacheFirst);
        assert_eq!(Strategy::for_class(RouteClass::ExternalAsset), Strategy::CacheFirst);
        assert_eq!(Strategy::for_class(RouteClass::StaticAsset), Strategy::StaleWhileRevalidate);
        assert_eq!(Strategy::for_class(RouteClass::Document), Strategy::NetworkFirst);
    }

    #[test]
    fn test_store_policy() {
        let not_found = Response::new(404, Vec::new(), "missing");
        let ok = Response::new(200, Vec::new(), "ok");

        assert!(StorePolicy::AnyStatus.should_store(&not_found));
        assert!(!StorePolicy::SuccessOnly.should_store(&not_found));
        assert!(StorePolicy::SuccessOnly.should_store(&ok));
    }

    #[test]
    fn test_store_policy_from_config() {
        assert_eq!(StorePolicy::from_config(&AppConfig::default()), StorePolicy::AnyStatus);
        let strict = AppConfig { cache_error_responses: false, ..Default::default() };
        assert_eq!(StorePolicy::from_config(&strict), StorePolicy::SuccessOnly);
    }

    #[test]
    fn test_served_offline() {
        let served = Served::offline();
        assert_eq!(served.source, Source::Synthetic);
        assert_eq!(served.response.status, 503);
    }
}
