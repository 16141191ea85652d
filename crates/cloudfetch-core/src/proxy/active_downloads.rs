//! RAII counting of bodies still being relayed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared count of relays whose body stream is still alive.
#[derive(Debug, Clone, Default)]
pub struct ActiveDownloads {
    count: Arc<AtomicUsize>,
}

impl ActiveDownloads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Register one relay; it stays counted until the guard is dropped.
    pub fn track(&self) -> ActiveDownloadGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        ActiveDownloadGuard { count: Arc::clone(&self.count) }
    }
}

/// Decrements the shared count on drop, whether the stream finished,
/// failed or was cancelled by the client going away.
#[derive(Debug)]
pub struct ActiveDownloadGuard {
    count: Arc<AtomicUsize>,
}

impl Drop for ActiveDownloadGuard {
    fn drop(&mut self) {
        let _ = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_sub(1));
    }
}
