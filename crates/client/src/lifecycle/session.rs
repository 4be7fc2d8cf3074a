//! Live client sessions that keep a waiting generation from activating.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Sessions {
    open: AtomicUsize,
    idle: Notify,
}

/// Counts open [`ClientSession`]s.
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    inner: Arc<Sessions>,
}

impl SessionTracker {
    pub fn open(&self) -> ClientSession {
        self.inner.open.fetch_add(1, Ordering::SeqCst);
        ClientSession { inner: Arc::clone(&self.inner) }
    }

    pub fn count(&self) -> usize {
        self.inner.open.load(Ordering::SeqCst)
    }

    /// Resolve once no sessions are open.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Guard for one live page. Dropping it closes the session.
#[derive(Debug)]
pub struct ClientSession {
    inner: Arc<Sessions>,
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        if self.inner.open.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}
