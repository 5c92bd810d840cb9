//! Cross-thread abort for a connection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared abort token. Cloning gives another handle to the same connection;
/// [`abort`](Self::abort) may be called from any thread. A read blocked on the
/// connection notices it within one wait slice and fails.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Error returned by a read on an aborted connection.
#[derive(Debug)]
pub struct ConnectionAborted;

impl std::fmt::Display for ConnectionAborted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "connection aborted")
    }
}

impl std::error::Error for ConnectionAborted {}
