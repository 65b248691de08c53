//! Readiness gate of the verification backend.

use std::sync::atomic::{AtomicBool, Ordering};

/// Reports whether the verification backend can accept records.
///
/// Fragments that arrive while the backend is down are dropped, not queued.
pub trait BackendGate: Send + Sync {
    /// Returns true if the backend is ready.
    fn is_ready(&self) -> bool;
}

/// Readiness flag flipped by the host's backend connection.
#[derive(Debug, Default)]
pub struct BackendStatus {
    ready: AtomicBool,
}

impl BackendStatus {
    /// Creates a status with the given initial readiness.
    #[must_use]
    pub const fn new(ready: bool) -> Self {
        Self {
            ready: AtomicBool::new(ready),
        }
    }

    /// Updates readiness.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }
}

impl BackendGate for BackendStatus {
    #[inline]
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}
