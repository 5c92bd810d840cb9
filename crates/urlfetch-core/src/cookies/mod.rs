//! Process-wide cookie handling.
//!
//! Every connection consults one shared [`CookieHandler`] so that servers
//! relying on session cookies see a consistent client across downloads. The
//! handler is registered at most once per process through
//! [`ensure_installed`]; a handler registered earlier by anyone else is kept.
//! Cookie support is best effort: if the registry cannot be used, downloads
//! carry on without cookies.

mod jar;

pub use jar::CookieJar;

use std::sync::{Arc, Mutex};
use url::Url;

/// Hook the connection layer uses to attach and collect cookies.
pub trait CookieHandler: Send + Sync {
    /// Value for the `Cookie` request header for `url`, if any cookie applies.
    fn cookie_header(&self, url: &Url) -> Option<String>;

    /// Records the `Set-Cookie` values received in a response from `url`.
    fn store(&self, url: &Url, set_cookie: &[String]);
}

static REGISTRY: Mutex<Option<Arc<dyn CookieHandler>>> = Mutex::new(None);

/// Registers the default [`CookieJar`] unless a handler is already registered.
///
/// Idempotent and safe to call from many threads at once: the check and the
/// registration happen under one lock. Never fails; if the registry is
/// unusable the problem is logged and cookies stay disabled.
pub fn ensure_installed() {
    match REGISTRY.lock() {
        Ok(mut slot) => {
            if slot.is_none() {
                *slot = Some(Arc::new(CookieJar::new()));
                tracing::debug!("installed process-wide cookie jar");
            }
        }
        Err(_) => {
            tracing::warn!("cookie registry unavailable; continuing without cookies");
        }
    }
}

/// Registers `handler` if no handler is registered yet. Returns whether it was registered.
pub fn install_if_absent(handler: Arc<dyn CookieHandler>) -> bool {
    match REGISTRY.lock() {
        Ok(mut slot) if slot.is_none() => {
            *slot = Some(handler);
            tracing::debug!("installed caller-supplied cookie handler");
            true
        }
        Ok(_) => false,
        Err(_) => {
            tracing::warn!("cookie registry unavailable; handler not installed");
            false
        }
    }
}

/// The registered handler, if any.
pub fn installed() -> Option<Arc<dyn CookieHandler>> {
    REGISTRY.lock().ok().and_then(|slot| slot.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nothing;

    impl CookieHandler for Nothing {
        fn cookie_header(&self, _url: &Url) -> Option<String> {
            None
        }
        fn store(&self, _url: &Url, _set_cookie: &[String]) {}
    }

    #[test]
    fn install_is_idempotent_and_never_overwrites() {
        ensure_installed();
        let first = installed().expect("handler after ensure_installed");
        ensure_installed();
        let second = installed().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!install_if_absent(Arc::new(Nothing)));
        assert!(Arc::ptr_eq(&first, &installed().unwrap()));
    }

    #[test]
    fn concurrent_install_registers_one_handler() {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                std::thread::spawn(|| {
                    ensure_installed();
                    installed().unwrap()
                })
            })
            .collect();
        let seen: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for h in &seen[1..] {
            assert!(Arc::ptr_eq(&seen[0], h));
        }
    }
}
