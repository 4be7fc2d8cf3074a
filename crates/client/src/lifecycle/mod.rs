//! Generation lifecycle: install, activate, garbage-collect.
//!
//! ```text
//! Installing -> Installed -> Active -> Superseded -> Deleted
//! ```
//!
//! Install fetches the whole precache manifest before touching the store, so
//! a failed fetch leaves no partial generation behind. Activation promotes
//! the configured generation and then deletes every other one.

mod active;
mod manifest;
mod session;

pub use active::ActiveGeneration;
pub use manifest::PrecacheManifest;
pub use session::{ClientSession, SessionTracker};

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use swcache_core::{AppConfig, CacheDb, CacheEntry, Error, GenerationHandle, GenerationInfo, GenerationState, Request};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use url::Url;

use crate::fetch::Fetcher;

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct ActivationReport {
    pub active: String,
    pub deleted: Vec<String>,
}

/// What [`LifecycleManager::deploy`] did after installing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeployOutcome {
    Activated(ActivationReport),
    /// Installed, waiting for open sessions to close.
    Waiting { generation: String, sessions: usize },
}

/// Owns every generation transition.
pub struct LifecycleManager {
    db: CacheDb,
    network: Arc<dyn Fetcher>,
    active: ActiveGeneration,
    sessions: SessionTracker,
    generation: String,
    manifest: PrecacheManifest,
    concurrency: usize,
    transition: Mutex<()>,
}

impl LifecycleManager {
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the base URL or a precache entry does
    /// not resolve.
    pub fn new(db: CacheDb, network: Arc<dyn Fetcher>, active: ActiveGeneration, config: &AppConfig) -> Result<Self, Error> {
        Ok(Self {
            db,
            network,
            active,
            sessions: SessionTracker::default(),
            generation: config.generation_name(),
            manifest: PrecacheManifest::from_config(config)?,
            concurrency: config.precache_concurrency.max(1),
            transition: Mutex::new(()),
        })
    }

    /// Name of the generation for the configured version.
    pub fn generation_name(&self) -> &str {
        &self.generation
    }

    pub fn manifest(&self) -> &PrecacheManifest {
        &self.manifest
    }

    /// Reload the active generation recorded in the store.
    pub async fn restore(&self) -> Result<Option<GenerationHandle>, Error> {
        let active = self.db.active_generation().await?;
        match &active {
            Some(generation) => tracing::info!(generation = generation.name(), "restored active generation"),
            None => tracing::info!("no active generation in store"),
        }
        self.active.set(active.clone()).await;
        Ok(active)
    }

    /// Populate the configured generation from the precache manifest.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailed` if any manifest entry fails to fetch or
    /// answers with a non-2xx status. Nothing is written in that case.
    pub async fn install(&self) -> Result<GenerationHandle, Error> {
        let start = Instant::now();
        tracing::info!(generation = %self.generation, entries = self.manifest.len(), "installing generation");

        let entries = match self.fetch_manifest().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(generation = %self.generation, error = %e, "install failed; active generation unchanged");
                return Err(e);
            }
        };

        let _transition = self.transition.lock().await;
        let generation = self.db.install_generation(&self.generation, entries).await?;

        tracing::info!(
            generation = generation.name(),
            entries = self.manifest.len(),
            install_ms = start.elapsed().as_millis() as u64,
            "generation installed"
        );
        Ok(generation)
    }

    async fn fetch_manifest(&self) -> Result<Vec<CacheEntry>, Error> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();

        for (index, url) in self.manifest.urls().iter().cloned().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::InstallFailed { url: url.to_string(), reason: e.to_string() })?;
            let network = Arc::clone(&self.network);

            join_set.spawn(async move {
                let _permit = permit;
                fetch_precache_entry(network.as_ref(), &url).await.map(|entry| (index, entry))
            });
        }

        let mut entries = Vec::with_capacity(self.manifest.len());
        while let Some(joined) = join_set.join_next().await {
            let fetched = joined
                .map_err(|e| Error::InstallFailed { url: "<precache task>".into(), reason: e.to_string() })
                .and_then(|result| result);
            match fetched {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    join_set.abort_all();
                    return Err(e);
                }
            }
        }

        entries.sort_by_key(|(index, _)| *index);
        Ok(entries.into_iter().map(|(_, entry)| entry).collect())
    }

    /// Make the configured generation active and delete every other one.
    ///
    /// # Errors
    ///
    /// Returns `Error::GenerationMissing` if the generation was never
    /// installed.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        let _transition = self.transition.lock().await;

        if self.db.generation_state(&self.generation).await? == GenerationState::Deleted {
            return Err(Error::GenerationMissing(self.generation.clone()));
        }

        let generation = self.db.promote_generation(&self.generation).await?;
        self.active.set(Some(generation.clone())).await;

        let mut deleted = Vec::new();
        for name in self.db.generation_names().await? {
            if name != self.generation && self.db.delete_generation(&name).await? {
                deleted.push(name);
            }
        }

        tracing::info!(generation = generation.name(), deleted = ?deleted, "generation activated");
        Ok(ActivationReport { active: generation.name().to_string(), deleted })
    }

    /// Install, then activate unless sessions are open.
    ///
    /// Nothing waits when no generation is active yet, or when the configured
    /// generation is already the active one.
    pub async fn deploy(&self) -> Result<DeployOutcome, Error> {
        let current = self.active.get().await;
        self.install().await?;

        let sessions = self.sessions.count();
        let refresh = current.as_ref().is_none_or(|g| g.name() == self.generation);
        if refresh || sessions == 0 {
            return Ok(DeployOutcome::Activated(self.activate().await?));
        }

        tracing::info!(generation = %self.generation, sessions, "installed generation waiting for sessions to close");
        Ok(DeployOutcome::Waiting { generation: self.generation.clone(), sessions })
    }

    /// Activate once the last open session closes.
    pub async fn activate_when_idle(&self) -> Result<ActivationReport, Error> {
        self.sessions.wait_idle().await;
        self.activate().await
    }

    /// Activate now, regardless of open sessions.
    pub async fn adopt_now(&self) -> Result<ActivationReport, Error> {
        tracing::info!(generation = %self.generation, sessions = self.sessions.count(), "adopting generation immediately");
        self.activate().await
    }

    pub fn open_session(&self) -> ClientSession {
        self.sessions.open()
    }

    pub fn sessions(&self) -> usize {
        self.sessions.count()
    }

    pub async fn generations(&self) -> Result<Vec<GenerationInfo>, Error> {
        self.db.list_generations().await
    }

    pub fn active(&self) -> &ActiveGeneration {
        &self.active
    }
}

/// Fetch one manifest URL. Anything but a 2xx response fails the install.
async fn fetch_precache_entry(network: &dyn Fetcher, url: &Url) -> Result<CacheEntry, Error> {
    let request = Request::get(url.as_str())?;
    let response = network
        .fetch(&request)
        .await
        .map_err(|e| Error::InstallFailed { url: url.to_string(), reason: e.to_string() })?;
    if !response.is_success() {
        return Err(Error::InstallFailed { url: url.to_string(), reason: format!("status {}", response.status) });
    }
    Ok(CacheEntry { identity: request.identity(), response })
}
