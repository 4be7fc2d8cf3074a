//! Stale-while-revalidate: answer from cache, refresh in the background.

use swcache_core::Request;

use super::background::Revalidation;
use super::{Served, Source, StrategyEngine};

impl StrategyEngine {
    pub(crate) async fn stale_while_revalidate(&self, request: &Request) -> Served {
        let generation = self.active.get().await;
        let identity = request.identity();

        let revalidation = self.background.revalidate(Revalidation {
            db: self.db.clone(),
            network: self.network.clone(),
            policy: self.policy,
            generation: generation.clone(),
            request: request.clone(),
        });

        if let Some(cached) = self.lookup(generation.as_ref(), &identity).await {
            self.background.detach(revalidation).await;
            return Served::new(cached, Source::Cache);
        }

        match revalidation.await {
            Ok(Ok(response)) => Served::new(response, Source::Network),
            Ok(Err(e)) => {
                tracing::warn!(url = %request.url, error = %e, "network failed on cache miss; serving offline response");
                Served::offline()
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "revalidation task aborted on cache miss");
                Served::offline()
            }
        }
    }
}
