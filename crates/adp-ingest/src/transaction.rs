//! Single-writer lock around the deposit pipeline
//!
//! Only one deposit may touch the repository at a time, otherwise
//! title-based idempotency and rollback-by-deleting-all-drafts would step
//! on each other. The lock is process-wide; acquisition gives up after a
//! configurable timeout rather than queueing forever.

use crate::error::{IngestError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Default time to wait for the deposit lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(600);

/// Cloneable handle to the deposit lock
#[derive(Debug, Clone)]
pub struct IngestLock {
    inner: Arc<Mutex<()>>,
    timeout: Duration,
}

impl IngestLock {
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(())),
            timeout,
        }
    }

    /// Acquire the lock, waiting at most the configured timeout
    pub async fn acquire(&self) -> Result<IngestGuard> {
        let guard = tokio::time::timeout(self.timeout, self.inner.clone().lock_owned())
            .await
            .map_err(|_| IngestError::LockTimeout(self.timeout))?;
        debug!("deposit lock acquired");
        Ok(IngestGuard { _guard: guard })
    }
}

impl Default for IngestLock {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

/// Held for the duration of a deposit; released on drop
#[derive(Debug)]
pub struct IngestGuard {
    _guard: OwnedMutexGuard<()>,
}
