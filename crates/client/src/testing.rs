//! Test doubles.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use swcache_core::{AppConfig, CacheDb, CacheEntry, GenerationHandle, Request, Response};

use crate::engine::OfflineCache;
use crate::fetch::{Fetcher, NetworkError};
use crate::lifecycle::{ActiveGeneration, LifecycleManager};
use crate::strategy::{Fallbacks, StorePolicy, StrategyEngine};

pub(crate) const BASE: &str = "https://app.test/";

pub(crate) fn url(path: &str) -> String {
    format!("https://app.test{path}")
}

pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        base_url: BASE.into(),
        precache: vec!["/".into(), "/offline.html".into(), "/app.js".into()],
        ..Default::default()
    }
}

#[derive(Clone)]
enum Reply {
    Status(u16, Bytes),
    Fail,
}

/// Scripted network. Unscripted URLs fail like an unreachable host.
#[derive(Default)]
pub(crate) struct StubNetwork {
    replies: Mutex<HashMap<String, Reply>>,
    latency: Mutex<Duration>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl StubNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) {
        let reply = Reply::Status(status, Bytes::copy_from_slice(body.as_bytes()));
        self.replies.lock().unwrap().insert(url.to_string(), reply);
    }

    pub fn fail(&self, url: &str) {
        self.replies.lock().unwrap().insert(url.to_string(), Reply::Fail);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Fetcher for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::Offline);
        }

        let reply = self.replies.lock().unwrap().get(request.url.as_str()).cloned();
        match reply {
            Some(Reply::Status(status, body)) => {
                Ok(Response::new(status, vec![("content-type".into(), "text/plain".into())], body))
            }
            Some(Reply::Fail) | None => Err(NetworkError::Connect(format!("unreachable: {}", request.url))),
        }
    }
}

/// Script a 200 reply with body `"body of {path}"` for each precache path.
pub(crate) fn serve_manifest(stub: &StubNetwork, config: &AppConfig) {
    for path in &config.precache {
        stub.respond(&url(path), 200, &format!("body of {path}"));
    }
}

/// Strategy engine over an active generation holding `entries` (path, body).
pub(crate) async fn seeded_engine(
    stub: &Arc<StubNetwork>, entries: &[(&str, &str)],
) -> (StrategyEngine, CacheDb, GenerationHandle) {
    seeded_engine_with_policy(stub, entries, StorePolicy::AnyStatus).await
}

pub(crate) async fn seeded_engine_with_policy(
    stub: &Arc<StubNetwork>, entries: &[(&str, &str)], policy: StorePolicy,
) -> (StrategyEngine, CacheDb, GenerationHandle) {
    let db = CacheDb::open_in_memory().await.unwrap();
    let entries = entries
        .iter()
        .map(|(path, body)| CacheEntry {
            identity: Request::get(&url(path)).unwrap().identity(),
            response: Response::new(200, Vec::new(), body.to_string()),
        })
        .collect();
    db.install_generation("test-v1", entries).await.unwrap();
    let generation = db.promote_generation("test-v1").await.unwrap();

    let active = ActiveGeneration::default();
    active.set(Some(generation.clone())).await;

    let network: Arc<dyn Fetcher> = stub.clone();
    let engine = StrategyEngine::new(db.clone(), network, active, Fallbacks::from_config(&test_config()), policy);
    (engine, db, generation)
}

/// Strategy engine with no active generation.
pub(crate) async fn bare_engine(stub: &Arc<StubNetwork>) -> StrategyEngine {
    let db = CacheDb::open_in_memory().await.unwrap();
    let network: Arc<dyn Fetcher> = stub.clone();
    StrategyEngine::new(
        db,
        network,
        ActiveGeneration::default(),
        Fallbacks::from_config(&test_config()),
        StorePolicy::AnyStatus,
    )
}

pub(crate) async fn lifecycle_for(stub: &Arc<StubNetwork>, config: &AppConfig) -> (Arc<LifecycleManager>, CacheDb) {
    let db = CacheDb::open_in_memory().await.unwrap();
    let network: Arc<dyn Fetcher> = stub.clone();
    let lifecycle = LifecycleManager::new(db.clone(), network, ActiveGeneration::default(), config).unwrap();
    (Arc::new(lifecycle), db)
}

/// Engine with the test manifest installed and active.
pub(crate) async fn deployed_cache(stub: &Arc<StubNetwork>) -> OfflineCache {
    let config = test_config();
    serve_manifest(stub, &config);
    let db = CacheDb::open_in_memory().await.unwrap();
    let network: Arc<dyn Fetcher> = stub.clone();
    let cache = OfflineCache::new(db, network, &config).await.unwrap();
    cache.lifecycle().deploy().await.unwrap();
    cache
}
