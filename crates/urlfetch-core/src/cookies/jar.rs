//! In-memory cookie store, the default process-wide handler.

use cookie_store::CookieStore;
use std::sync::{Mutex, MutexGuard};
use url::Url;

use super::CookieHandler;

/// Cookies received during this process, shared by every download.
///
/// Parsing, domain and path matching and expiry follow RFC 6265 as
/// implemented by `cookie_store`; this type only adds the locking.
#[derive(Default)]
pub struct CookieJar {
    store: Mutex<CookieStore>,
}

impl std::fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieJar").field("len", &self.len()).finish()
    }
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unexpired cookies currently held.
    pub fn len(&self) -> usize {
        self.lock().iter_unexpired().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, CookieStore> {
        // A panic while holding the lock leaves the store itself intact.
        self.store.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl CookieHandler for CookieJar {
    fn cookie_header(&self, url: &Url) -> Option<String> {
        let store = self.lock();
        let header = store
            .get_request_values(url)
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        if header.is_empty() {
            None
        } else {
            Some(header)
        }
    }

    fn store(&self, url: &Url, set_cookie: &[String]) {
        let mut store = self.lock();
        for line in set_cookie {
            if let Err(e) = store.parse(line, url) {
                tracing::debug!("ignoring Set-Cookie from {}: {}", url, e);
            }
        }
    }
}
