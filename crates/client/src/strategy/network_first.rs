//! Network-first: prefer the network, fall back to cache, then to navigation documents.

use swcache_core::{GenerationHandle, Request, RequestIdentity, Response};

use super::{Served, Source, StrategyEngine};
use crate::fetch::resolve;

impl StrategyEngine {
    pub(crate) async fn network_first(&self, request: &Request) -> Served {
        let generation = self.active.get().await;
        let identity = request.identity();

        let error = match self.network.fetch(request).await {
            Ok(response) => {
                self.store(generation.as_ref(), &identity, &response).await;
                return Served::new(response, Source::Network);
            }
            Err(e) => e,
        };

        tracing::warn!(url = %request.url, error = %error, "network failed; trying cache");

        if let Some(cached) = self.lookup(generation.as_ref(), &identity).await {
            return Served::new(cached, Source::Cache);
        }

        if request.navigate {
            let documents = [
                (self.fallbacks.offline_document.as_str(), Source::OfflineDocument),
                (self.fallbacks.root_document.as_str(), Source::RootDocument),
            ];
            for (path, source) in documents {
                if let Some(document) = self.fallback_document(generation.as_ref(), request, path).await {
                    tracing::debug!(url = %request.url, fallback = path, "serving navigation fallback");
                    return Served::new(document, source);
                }
            }
        }

        Served::offline()
    }

    async fn fallback_document(
        &self, generation: Option<&GenerationHandle>, request: &Request, path: &str,
    ) -> Option<Response> {
        let url = match resolve(&request.url, path) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(path, error = %e, "fallback document path does not resolve");
                return None;
            }
        };
        self.lookup(generation, &RequestIdentity::get(&url)).await
    }
}
