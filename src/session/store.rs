//! Session store module
//!
//! Concurrent mapping from client identity to session state. Lookups take a
//! shared lock so readers never block each other; creation takes the
//! exclusive lock and re-checks the entry, so two concurrent first requests
//! from one client can never observe two different sessions.

use super::Session;
use crate::logger;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Concurrent client-identity -> session mapping
///
/// The expiration duration is fixed at construction and immutable for the
/// process lifetime. Entries are never evicted (observed contract of the
/// design; eviction on expiry is a possible extension, not a default).
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    expiration: Duration,
}

impl SessionStore {
    pub fn new(expiration: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            expiration,
        }
    }

    /// Look up the caller's session, creating one on first contact
    pub fn get_or_create(&self, remote_addr: &str) -> Arc<Session> {
        let key = client_key(remote_addr);

        if let Ok(sessions) = self.sessions.read() {
            if let Some(session) = sessions.get(&key) {
                return Arc::clone(session);
            }
        }

        match self.sessions.write() {
            Ok(mut sessions) => {
                // Re-check under the exclusive lock: a concurrent first
                // request may have inserted between the two lock scopes.
                let session = sessions.entry(key.clone()).or_insert_with(|| {
                    logger::log_session_created(&key);
                    Arc::new(Session::new())
                });
                Arc::clone(session)
            }
            // Poisoned lock: hand out a detached session rather than fail
            // the request. The map is only poisoned if an insert panicked.
            Err(_) => Arc::new(Session::new()),
        }
    }

    /// Whether the session had seen no activity for longer than the
    /// expiration duration, measured at `now`. Exactly at the boundary is
    /// not expired.
    pub fn is_expired_at(&self, session: &Session, now: Instant) -> bool {
        now.saturating_duration_since(session.last_seen()) > self.expiration
    }

    /// Expiration check against the current time
    pub fn is_expired(&self, session: &Session) -> bool {
        self.is_expired_at(session, Instant::now())
    }

    /// Number of tracked client identities
    pub fn len(&self) -> usize {
        self.sessions.read().map_or(0, |sessions| sessions.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Derive a stable store key from a raw remote address
///
/// The port changes between connections from the same client, so only the
/// host portion identifies the client. An address that does not parse is
/// used verbatim rather than rejected.
fn client_key(remote_addr: &str) -> String {
    match remote_addr.parse::<SocketAddr>() {
        Ok(addr) => addr.ip().to_string(),
        Err(_) => {
            logger::log_warning(&format!(
                "Could not split host:port for '{remote_addr}', using full address as session key"
            ));
            remote_addr.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(Duration::from_secs(30))
    }

    #[test]
    fn test_same_identity_gets_same_session() {
        let store = store();
        let first = store.get_or_create("10.0.0.1:50000");
        first.authorize();
        let second = store.get_or_create("10.0.0.1:50001");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.is_authorized());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_distinct_identities_get_distinct_sessions() {
        let store = store();
        let a = store.get_or_create("10.0.0.1:50000");
        let b = store.get_or_create("10.0.0.2:50000");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_key_strips_port() {
        assert_eq!(client_key("192.168.1.7:61234"), "192.168.1.7");
        assert_eq!(client_key("[::1]:8080"), "::1");
    }

    #[test]
    fn test_unparseable_address_used_verbatim() {
        assert_eq!(client_key("unix-socket-peer"), "unix-socket-peer");
        let store = store();
        let a = store.get_or_create("unix-socket-peer");
        let b = store.get_or_create("unix-socket-peer");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_concurrent_first_requests_create_one_session() {
        let store = Arc::new(store());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                store.get_or_create("172.16.0.9:40000")
            }));
        }
        let sessions: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for session in &sessions[1..] {
            assert!(Arc::ptr_eq(&sessions[0], session));
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_expiry_is_strict_inequality() {
        let store = SessionStore::new(Duration::from_secs(30));
        let session = Session::new();
        let seen = session.last_seen();
        assert!(!store.is_expired_at(&session, seen + Duration::from_secs(29)));
        // Exactly at the boundary: not expired
        assert!(!store.is_expired_at(&session, seen + Duration::from_secs(30)));
        assert!(store.is_expired_at(&session, seen + Duration::from_secs(30) + Duration::from_nanos(1)));
    }

    #[test]
    fn test_touch_resets_expiry() {
        let store = SessionStore::new(Duration::from_millis(10));
        let session = store.get_or_create("10.1.1.1:1");
        std::thread::sleep(Duration::from_millis(20));
        assert!(store.is_expired(&session));
        session.touch();
        assert!(!store.is_expired(&session));
    }
}
