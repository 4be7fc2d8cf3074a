//! The request-interception entry point.
//!
//! [`OfflineCache`] wires the router, strategy engine, lifecycle manager and
//! control channel around one store and one network capability.

use std::sync::{Arc, Mutex};

use swcache_core::{AppConfig, CacheDb, Error, Request, Response, StoreStats};
use tokio::sync::mpsc;

use crate::control::ControlChannel;
use crate::fetch::{Fetcher, NetworkError};
use crate::lifecycle::{ActiveGeneration, ClientSession, LifecycleManager};
use crate::router::{BypassReason, Route, RouteClass, Router};
use crate::strategy::{Fallbacks, RevalidationStats, Served, StorePolicy, Strategy, StrategyEngine};

/// How an intercepted request was handled.
#[derive(Debug, Clone)]
pub enum Intercept {
    /// Left to the default network path; no store operations happened.
    Passthrough(BypassReason),
    Respond { class: RouteClass, strategy: Strategy, served: Served },
}

/// Offline cache manager for one application origin.
pub struct OfflineCache {
    db: CacheDb,
    network: Arc<dyn Fetcher>,
    router: Router,
    strategies: StrategyEngine,
    lifecycle: Arc<LifecycleManager>,
    control: ControlChannel,
    sync_tags: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
}

impl OfflineCache {
    /// Build the engine and restore the active generation from the store.
    ///
    /// Does not install anything; call [`LifecycleManager::deploy`] for that.
    pub async fn new(db: CacheDb, network: Arc<dyn Fetcher>, config: &AppConfig) -> Result<Self, Error> {
        let active = ActiveGeneration::default();
        let lifecycle = Arc::new(LifecycleManager::new(db.clone(), Arc::clone(&network), active.clone(), config)?);
        lifecycle.restore().await?;

        let strategies = StrategyEngine::new(
            db.clone(),
            Arc::clone(&network),
            active,
            Fallbacks::from_config(config),
            StorePolicy::from_config(config),
        );
        let (control, sync_tags) = ControlChannel::new(Arc::clone(&lifecycle));

        Ok(Self {
            db,
            network,
            router: Router::from_config(config),
            strategies,
            lifecycle,
            control,
            sync_tags: Mutex::new(Some(sync_tags)),
        })
    }

    /// Route a request and, unless bypassed, resolve it with its strategy.
    pub async fn handle(&self, request: &Request) -> Intercept {
        match self.router.classify(request) {
            Route::Bypass(reason) => {
                tracing::debug!(method = %request.method, url = %request.url, ?reason, "request bypassed");
                Intercept::Passthrough(reason)
            }
            Route::Intercept(class) => {
                let strategy = Strategy::for_class(class);
                tracing::debug!(method = %request.method, url = %request.url, ?class, ?strategy, "request intercepted");
                let served = self.strategies.run(strategy, request).await;
                Intercept::Respond { class, strategy, served }
            }
        }
    }

    /// Like [`handle`](Self::handle), sending bypassed requests to the network.
    pub async fn respond(&self, request: &Request) -> Result<Response, NetworkError> {
        match self.handle(request).await {
            Intercept::Passthrough(_) => self.passthrough(request).await,
            Intercept::Respond { served, .. } => Ok(served.response),
        }
    }

    /// The default network path for bypassed requests.
    pub async fn passthrough(&self, request: &Request) -> Result<Response, NetworkError> {
        self.network.fetch(request).await
    }

    pub fn lifecycle(&self) -> &Arc<LifecycleManager> {
        &self.lifecycle
    }

    pub fn control(&self) -> &ControlChannel {
        &self.control
    }

    /// Receiver for `BACKGROUND_SYNC` tags. Only the first call gets it.
    pub fn take_sync_tags(&self) -> Option<mpsc::UnboundedReceiver<String>> {
        self.sync_tags.lock().ok().and_then(|mut tags| tags.take())
    }

    pub fn open_session(&self) -> ClientSession {
        self.lifecycle.open_session()
    }

    /// Wait for background revalidations to finish.
    pub async fn settle(&self) {
        self.strategies.settle().await;
    }

    pub fn revalidation_stats(&self) -> RevalidationStats {
        self.strategies.revalidation_stats()
    }

    pub fn store(&self) -> &CacheDb {
        &self.db
    }

    pub fn store_stats(&self) -> StoreStats {
        self.db.stats()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::lifecycle::DeployOutcome;
    use crate::strategy::Source;
    use crate::testing::{StubNetwork, deployed_cache, serve_manifest, test_config, url};

    #[tokio::test]
    async fn test_unsafe_method_touches_nothing() {
        let stub = StubNetwork::new();
        let cache = deployed_cache(&stub).await;
        let before = cache.store_stats();
        let calls = stub.calls();

        let intercept = cache.handle(&Request::new("POST", &url("/data/items")).unwrap()).await;

        assert!(matches!(intercept, Intercept::Passthrough(BypassReason::UnsafeMethod)));
        assert_eq!(cache.store_stats(), before);
        assert_eq!(stub.calls(), calls);
    }

    #[tokio::test]
    async fn test_foreign_scheme_touches_nothing() {
        let stub = StubNetwork::new();
        let cache = deployed_cache(&stub).await;
        let before = cache.store_stats();

        let intercept = cache.handle(&Request::get("chrome-extension://abc/inject.js").unwrap()).await;

        assert!(matches!(intercept, Intercept::Passthrough(BypassReason::ForeignScheme)));
        assert_eq!(cache.store_stats(), before);
    }

    #[tokio::test]
    async fn test_respond_forwards_bypassed_request() {
        let stub = StubNetwork::new();
        let cache = deployed_cache(&stub).await;
        stub.respond(&url("/data/items"), 201, "created");
        let before = cache.store_stats();

        let response = cache.respond(&Request::new("POST", &url("/data/items")).unwrap()).await.unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(cache.store_stats(), before);
    }

    #[tokio::test]
    async fn test_routes_to_strategies() {
        let stub = StubNetwork::new();
        let cache = deployed_cache(&stub).await;
        stub.respond(&url("/data/items.json"), 200, "[]");

        let intercept = cache.handle(&Request::get(&url("/data/items.json")).unwrap()).await;
        assert!(matches!(
            intercept,
            Intercept::Respond { class: RouteClass::DataAsset, strategy: Strategy::CacheFirst, .. }
        ));

        let intercept = cache.handle(&Request::get(&url("/app.js")).unwrap()).await;
        match intercept {
            Intercept::Respond { class, strategy, served } => {
                assert_eq!(class, RouteClass::StaticAsset);
                assert_eq!(strategy, Strategy::StaleWhileRevalidate);
                assert_eq!(served.source, Source::Cache);
            }
            other => panic!("expected response, got {other:?}"),
        }
        cache.settle().await;
    }

    #[tokio::test]
    async fn test_offline_navigation_serves_precached_document() {
        let stub = StubNetwork::new();
        let cache = deployed_cache(&stub).await;
        stub.set_offline(true);

        let intercept = cache.handle(&Request::navigation(&url("/reports/q3")).unwrap()).await;

        match intercept {
            Intercept::Respond { served, .. } => {
                assert_eq!(served.source, Source::OfflineDocument);
                assert_eq!(served.response.text(), "body of /offline.html");
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_new_restores_active_generation() {
        let stub = StubNetwork::new();
        let first = deployed_cache(&stub).await;
        let db = first.store().clone();
        stub.set_offline(true);

        let network: Arc<dyn Fetcher> = stub.clone();
        let restarted = OfflineCache::new(db, network, &test_config()).await.unwrap();
        let response = restarted.respond(&Request::get(&url("/app.js")).unwrap()).await.unwrap();

        assert_eq!(response.text(), "body of /app.js");
        restarted.settle().await;
    }

    #[tokio::test]
    async fn test_control_and_sync_tags() {
        let stub = StubNetwork::new();
        serve_manifest(&stub, &test_config());
        let db = CacheDb::open_in_memory().await.unwrap();
        let network: Arc<dyn Fetcher> = stub.clone();
        let cache = OfflineCache::new(db, network, &test_config()).await.unwrap();
        let mut tags = cache.take_sync_tags().unwrap();
        assert!(cache.take_sync_tags().is_none());

        let outcome = cache.lifecycle().deploy().await.unwrap();
        assert!(matches!(outcome, DeployOutcome::Activated(_)));

        cache.control().deliver(&json!({"kind": "BACKGROUND_SYNC", "tag": "outbox"})).await.unwrap();
        assert_eq!(tags.recv().await.as_deref(), Some("outbox"));
    }
}
