//! Cache-first: serve from the active generation, fill from the network on a miss.

use swcache_core::Request;

use super::{Served, Source, StrategyEngine};

impl StrategyEngine {
    pub(crate) async fn cache_first(&self, request: &Request) -> Served {
        let generation = self.active.get().await;
        let identity = request.identity();

        if let Some(cached) = self.lookup(generation.as_ref(), &identity).await {
            return Served::new(cached, Source::Cache);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.store(generation.as_ref(), &identity, &response).await;
                Served::new(response, Source::Network)
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "network failed on cache miss; serving offline response");
                Served::offline()
            }
        }
    }
}
