//! The generation currently serving requests.

use std::sync::Arc;

use swcache_core::GenerationHandle;
use tokio::sync::RwLock;

/// Shared pointer to the active generation.
///
/// The lifecycle manager is the only writer; strategies snapshot it once per
/// request.
#[derive(Debug, Clone, Default)]
pub struct ActiveGeneration(Arc<RwLock<Option<GenerationHandle>>>);

impl ActiveGeneration {
    pub async fn get(&self) -> Option<GenerationHandle> {
        self.0.read().await.clone()
    }

    pub(crate) async fn set(&self, generation: Option<GenerationHandle>) {
        *self.0.write().await = generation;
    }
}
