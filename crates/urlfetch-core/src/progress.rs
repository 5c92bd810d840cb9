//! Progress reporting for transfers.
//!
//! The copier never talks to a UI. Callers hand in a [`ProgressObserver`]
//! and the body reader is wrapped in a [`ProgressReader`] for the duration of
//! one copy. Observers only watch; they cannot change what gets copied, except
//! by asking to cancel.

use std::io::{self, Read};
use std::sync::Arc;

/// Label shown for a transfer of `url`.
pub fn progress_label(url: &str) -> String {
    format!("Downloading {}", url)
}

/// Receives progress for a single transfer.
pub trait ProgressObserver: Send + Sync {
    /// Called once before the first read. `total` is the expected body size if known.
    fn begin(&self, _label: &str, _total: Option<u64>) {}

    /// Called after every successful read with the cumulative byte count.
    fn advance(&self, transferred: u64);

    /// Called once when the copy returns, successfully or not.
    fn finish(&self) {}

    /// Polled before each read; returning true fails the transfer with [`Cancelled`].
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Observer that ignores everything (non-interactive use).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn advance(&self, _transferred: u64) {}
}

/// Error returned by a read when the observer requested cancellation.
#[derive(Debug)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "transfer cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Reader that reports every read to an observer.
pub struct ProgressReader<R> {
    inner: R,
    observer: Arc<dyn ProgressObserver>,
    transferred: u64,
}

impl<R: Read> ProgressReader<R> {
    /// Wraps `inner` and announces the transfer to `observer`.
    pub fn new(
        inner: R,
        observer: Arc<dyn ProgressObserver>,
        label: &str,
        total: Option<u64>,
    ) -> Self {
        observer.begin(label, total);
        Self {
            inner,
            observer,
            transferred: 0,
        }
    }

    pub fn transferred(&self) -> u64 {
        self.transferred
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.observer.is_cancelled() {
            return Err(io::Error::other(Cancelled));
        }
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.transferred += n as u64;
            self.observer.advance(self.transferred);
        }
        Ok(n)
    }
}

impl<R> Drop for ProgressReader<R> {
    fn drop(&mut self) {
        self.observer.finish();
    }
}
