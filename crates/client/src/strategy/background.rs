//! Detached revalidation tasks.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use swcache_core::{CacheDb, GenerationHandle, Request, Response};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};

use super::{StorePolicy, store};
use crate::fetch::{Fetcher, NetworkError};

/// Counts of revalidation fetches since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct RevalidationStats {
    pub started: u64,
    pub succeeded: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    started: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

/// Owns revalidations whose result nobody is waiting for.
#[derive(Debug, Default)]
pub(crate) struct Background {
    tasks: Mutex<JoinSet<()>>,
    counters: Arc<Counters>,
}

/// What a revalidation needs, captured when it starts.
pub(crate) struct Revalidation {
    pub db: CacheDb,
    pub network: Arc<dyn Fetcher>,
    pub policy: StorePolicy,
    pub generation: Option<GenerationHandle>,
    pub request: Request,
}

impl Background {
    pub fn stats(&self) -> RevalidationStats {
        RevalidationStats {
            started: self.counters.started.load(Ordering::Relaxed),
            succeeded: self.counters.succeeded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Fetch and store on a separate task.
    ///
    /// The write targets the generation that was active when the task
    /// started; if that generation is deleted in the meantime the write is
    /// dropped by the store.
    pub fn revalidate(&self, job: Revalidation) -> JoinHandle<Result<Response, NetworkError>> {
        self.counters.started.fetch_add(1, Ordering::Relaxed);
        let counters = Arc::clone(&self.counters);

        tokio::spawn(async move {
            let Revalidation { db, network, policy, generation, request } = job;
            match network.fetch(&request).await {
                Ok(response) => {
                    store(&db, policy, generation.as_ref(), &request.identity(), &response).await;
                    counters.succeeded.fetch_add(1, Ordering::Relaxed);
                    Ok(response)
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(url = %request.url, error = %e, "revalidation fetch failed");
                    Err(e)
                }
            }
        })
    }

    /// Keep a revalidation running without waiting on it.
    pub async fn detach(&self, handle: JoinHandle<Result<Response, NetworkError>>) {
        let mut tasks = self.tasks.lock().await;
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "revalidation task aborted");
            }
        });
    }

    /// Wait until every detached revalidation has finished.
    ///
    /// Pending tasks are moved out before draining so `detach` never waits
    /// on the network. Revalidations detached meanwhile are picked up by the
    /// next round.
    pub async fn settle(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.tasks.lock().await);
            if pending.is_empty() {
                return;
            }
            while pending.join_next().await.is_some() {}
        }
    }
}
