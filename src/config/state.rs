// Application state module
// Dependency-injection root: everything the dispatcher needs, built once in
// main and passed explicitly to every connection task. No globals.

use std::sync::atomic::AtomicBool;

use super::types::Config;
use crate::routes::RouteTable;
use crate::session::SessionStore;

/// Shared application state
pub struct AppState {
    pub config: Config,
    /// The only shared mutable resource in the pipeline
    pub sessions: SessionStore,
    /// Read-only after startup, no locking required
    pub routes: RouteTable,

    // Cached config value for lock-free access on the hot path
    pub cached_access_log: AtomicBool,
}

impl AppState {
    pub fn new(config: Config, routes: RouteTable) -> Self {
        let sessions = SessionStore::new(config.session_expiration());
        let cached_access_log = AtomicBool::new(config.logging.access_log);
        Self {
            config,
            sessions,
            routes,
            cached_access_log,
        }
    }
}
