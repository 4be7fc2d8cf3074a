//! Out-of-band control messages from the host.
//!
//! ```json
//! { "kind": "ADOPT_NOW" }
//! { "kind": "BACKGROUND_SYNC", "tag": "outbox" }
//! ```
//!
//! Anything else is ignored.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use swcache_core::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::lifecycle::{ActivationReport, LifecycleManager};

/// A recognized control message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "kind")]
pub enum ControlMessage {
    #[serde(rename = "ADOPT_NOW")]
    AdoptNow,
    #[serde(rename = "BACKGROUND_SYNC")]
    BackgroundSync { tag: String },
}

impl ControlMessage {
    /// Parse a raw message, `None` for anything unrecognized.
    pub fn parse(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }
}

/// What handling a message did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ControlOutcome {
    Adopted(ActivationReport),
    SyncAcknowledged { tag: String },
    Ignored,
}

/// Dispatches control messages to the lifecycle manager and the sync queue.
#[derive(Clone)]
pub struct ControlChannel {
    lifecycle: Arc<LifecycleManager>,
    sync: mpsc::UnboundedSender<String>,
}

impl ControlChannel {
    /// Create a channel. Sync tags are forwarded to the returned receiver.
    pub fn new(lifecycle: Arc<LifecycleManager>) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sync, tags) = mpsc::unbounded_channel();
        (Self { lifecycle, sync }, tags)
    }

    /// Handle one raw message.
    ///
    /// # Errors
    ///
    /// Returns the activation error if `ADOPT_NOW` cannot activate the
    /// configured generation.
    pub async fn deliver(&self, raw: &Value) -> Result<ControlOutcome, Error> {
        let Some(message) = ControlMessage::parse(raw) else {
            tracing::debug!(message = %raw, "ignoring unrecognized control message");
            return Ok(ControlOutcome::Ignored);
        };

        match message {
            ControlMessage::AdoptNow => Ok(ControlOutcome::Adopted(self.lifecycle.adopt_now().await?)),
            ControlMessage::BackgroundSync { tag } => {
                tracing::info!(tag = %tag, "background sync requested");
                if self.sync.send(tag.clone()).is_err() {
                    tracing::warn!(tag = %tag, "no sync consumer attached; tag dropped");
                }
                Ok(ControlOutcome::SyncAcknowledged { tag })
            }
        }
    }

    /// Drain `messages` on a separate task until every sender is dropped.
    pub fn spawn(self, mut messages: mpsc::Receiver<Value>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(message) = messages.recv().await {
                if let Err(e) = self.deliver(&message).await {
                    tracing::warn!(error = %e, "control message failed");
                }
            }
            tracing::debug!("control channel closed");
        })
    }
}
