//! Offline cache engine for swcache.
//!
//! Intercepts requests for one application origin, answers them from a
//! versioned on-disk cache or the network according to their route class,
//! and manages cache generations across deployments.

pub mod control;
pub mod engine;
pub mod fetch;
pub mod lifecycle;
pub mod router;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

pub use control::{ControlChannel, ControlMessage, ControlOutcome};
pub use engine::{Intercept, OfflineCache};
pub use fetch::{FetchClient, FetchConfig, Fetcher, NetworkError};
pub use lifecycle::{
    ActivationReport, ActiveGeneration, ClientSession, DeployOutcome, LifecycleManager, PrecacheManifest,
};
pub use router::{BypassReason, Route, RouteClass, Router};
pub use strategy::{Fallbacks, RevalidationStats, Served, Source, StorePolicy, Strategy, StrategyEngine};
