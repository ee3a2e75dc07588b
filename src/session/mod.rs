//! Session module
//!
//! Per-client volatile state: an authorization flag and a last-activity
//! timestamp, keyed by client network identity. Sessions are created lazily
//! by the [`store::SessionStore`] and live for the rest of the process.

pub mod store;

pub use store::SessionStore;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Per-client session record
///
/// Shared across concurrent requests as `Arc<Session>`; both fields use
/// interior mutability so a custom route handler can flip `authorized`
/// through a shared reference.
#[derive(Debug)]
pub struct Session {
    authorized: AtomicBool,
    last_seen: Mutex<Instant>,
}

impl Session {
    /// New unauthorized session, last seen now
    pub fn new() -> Self {
        Self {
            authorized: AtomicBool::new(false),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    /// Advance the last-activity timestamp to now
    ///
    /// Called once per successfully served static request, after the
    /// response body has been produced. A request that fails mid-serve
    /// does not extend its own session.
    pub fn touch(&self) {
        if let Ok(mut last_seen) = self.last_seen.lock() {
            *last_seen = Instant::now();
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::Relaxed)
    }

    /// Grant authorization
    ///
    /// Only custom route handlers call this; the dispatch pipeline itself
    /// never mutates the flag, and no de-authorization path exists.
    pub fn authorize(&self) {
        self.authorized.store(true, Ordering::Relaxed);
    }

    /// The last-activity timestamp
    pub fn last_seen(&self) -> Instant {
        self.last_seen
            .lock()
            .map_or_else(|poisoned| *poisoned.into_inner(), |guard| *guard)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
