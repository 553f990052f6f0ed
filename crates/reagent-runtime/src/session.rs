//! Session tracking.
//!
//! A session is an id and a query ordinal. The first routed query of a
//! session defaults to the deep pipeline, later ones to lite. Ordinal
//! updates are atomic per session; distinct sessions never contend.

use dashmap::DashMap;
use metrics::gauge;
use uuid::Uuid;

/// Outcome of admitting a query into a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionTicket {
    /// Session id (client-supplied or freshly generated).
    pub session_id: String,
    /// Ordinal of this query within the session, starting at 1.
    pub query_count: u64,
    /// Whether this query created the session.
    pub is_first_query: bool,
}

/// Shared session table.
///
/// An unknown client-supplied id creates a new session under that id, so
/// clients may mint their own identifiers.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, u64>,
}

impl SessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a query: create the session or increment its ordinal.
    pub fn begin_query(&self, session_id: Option<&str>) -> SessionTicket {
        let id = session_id
            .map(ToString::to_string)
            .unwrap_or_else(|| Uuid::now_v7().to_string());
        let mut entry = self.sessions.entry(id.clone()).or_insert(0);
        *entry += 1;
        let count = *entry;
        drop(entry);
        gauge!("reagent_sessions_active").set(self.sessions.len() as f64);
        SessionTicket {
            session_id: id,
            query_count: count,
            is_first_query: count == 1,
        }
    }

    /// Current ordinal of a session, if it exists.
    #[must_use]
    pub fn get(&self, session_id: &str) -> Option<u64> {
        self.sessions.get(session_id).map(|e| *e)
    }

    /// Remove a session. Returns whether it existed.
    pub fn delete(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        gauge!("reagent_sessions_active").set(self.sessions.len() as f64);
        removed
    }

    /// Number of live sessions.
    #[must_use]
    pub fn active(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn first_query_creates_session() {
        let store = SessionStore::new();
        let t = store.begin_query(None);
        assert_eq!(t.query_count, 1);
        assert!(t.is_first_query);
        assert_eq!(store.get(&t.session_id), Some(1));
    }

    #[test]
    fn ordinal_increments_strictly() {
        let store = SessionStore::new();
        let t1 = store.begin_query(Some("s1"));
        let t2 = store.begin_query(Some("s1"));
        let t3 = store.begin_query(Some("s1"));
        assert_eq!(t1.query_count, 1);
        assert_eq!(t2.query_count, 2);
        assert_eq!(t3.query_count, 3);
        assert!(!t2.is_first_query);
    }

    #[test]
    fn client_supplied_unknown_id_creates_under_that_id() {
        let store = SessionStore::new();
        let t = store.begin_query(Some("client-chosen"));
        assert_eq!(t.session_id, "client-chosen");
        assert!(t.is_first_query);
    }

    #[test]
    fn delete_is_idempotent_safe() {
        let store = SessionStore::new();
        let _ = store.begin_query(Some("s1"));
        assert!(store.delete("s1"));
        assert!(!store.delete("s1"));
        assert_eq!(store.get("s1"), None);
    }

    #[test]
    fn deleted_session_restarts_at_one() {
        let store = SessionStore::new();
        let _ = store.begin_query(Some("s1"));
        let _ = store.begin_query(Some("s1"));
        let _ = store.delete("s1");
        let t = store.begin_query(Some("s1"));
        assert!(t.is_first_query);
        assert_eq!(t.query_count, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_serialize_per_session() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let _ = store.begin_query(Some("shared"));
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(store.get("shared"), Some(32));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn distinct_sessions_progress_independently() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for _ in 0..4 {
                    let _ = store.begin_query(Some(&format!("s{i}")));
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        for i in 0..8 {
            assert_eq!(store.get(&format!("s{i}")), Some(4));
        }
    }
}
