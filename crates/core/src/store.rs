// crates/core/src/store.rs
//! In-memory session store: the single source of truth for job state.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::types::{ProgressSnapshot, SessionId};

/// Errors raised by [`SessionStore`] writes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("session already exists: {0}")]
    AlreadyExists(SessionId),

    #[error("session not found: {0}")]
    UnknownSession(SessionId),

    #[error("session {0} already reached a terminal state")]
    Terminal(SessionId),

    #[error("session store lock poisoned")]
    Poisoned,
}

struct Entry {
    snapshot: ProgressSnapshot,
    updated_at: Instant,
}

/// Map from session id to its latest [`ProgressSnapshot`].
///
/// Writes replace the whole snapshot under the write lock; readers get a
/// clone, so a reader never sees a half-applied update. A terminal snapshot
/// is final: later writes for that session are rejected.
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Entry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Insert the first snapshot of a new session.
    pub fn insert_new(&self, snapshot: ProgressSnapshot) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().map_err(|e| {
            tracing::error!("RwLock poisoned writing session store: {e}");
            StoreError::Poisoned
        })?;
        let id = snapshot.session_id().to_owned();
        if sessions.contains_key(&id) {
            return Err(StoreError::AlreadyExists(id));
        }
        sessions.insert(
            id,
            Entry {
                snapshot,
                updated_at: Instant::now(),
            },
        );
        Ok(())
    }

    /// Overwrite the snapshot of an existing, non-terminal session.
    pub fn update(&self, snapshot: ProgressSnapshot) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().map_err(|e| {
            tracing::error!("RwLock poisoned writing session store: {e}");
            StoreError::Poisoned
        })?;
        let id = snapshot.session_id();
        let entry = sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownSession(id.to_owned()))?;
        if entry.snapshot.is_terminal() {
            return Err(StoreError::Terminal(id.to_owned()));
        }
        entry.snapshot = snapshot;
        entry.updated_at = Instant::now();
        Ok(())
    }

    /// Current snapshot of a session, if known.
    pub fn get(&self, session_id: &str) -> Option<ProgressSnapshot> {
        match self.sessions.read() {
            Ok(sessions) => sessions.get(session_id).map(|e| e.snapshot.clone()),
            Err(e) => {
                tracing::error!("RwLock poisoned reading session store: {e}");
                None
            }
        }
    }

    pub fn contains(&self, session_id: &str) -> bool {
        match self.sessions.read() {
            Ok(sessions) => sessions.contains_key(session_id),
            Err(e) => {
                tracing::error!("RwLock poisoned reading session store: {e}");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop terminal sessions whose final write is at least `max_age` old.
    /// Returns the number of sessions removed.
    pub fn remove_terminal_older_than(&self, max_age: Duration) -> usize {
        let mut sessions = match self.sessions.write() {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("RwLock poisoned writing session store: {e}");
                return 0;
            }
        };
        let before = sessions.len();
        sessions.retain(|_, e| !(e.snapshot.is_terminal() && e.updated_at.elapsed() >= max_age));
        before - sessions.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn test_insert_and_get() {
        let store = SessionStore::new();
        assert!(store.is_empty());
        store.insert_new(ProgressSnapshot::starting("s1")).unwrap();

        assert!(store.contains("s1"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("s1").unwrap().log(), Some("starting"));
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_insert_rejects_duplicate() {
        let store = SessionStore::new();
        store.insert_new(ProgressSnapshot::starting("s1")).unwrap();
        let err = store.insert_new(ProgressSnapshot::starting("s1")).unwrap_err();
        assert_eq!(err, StoreError::AlreadyExists("s1".into()));
    }

    #[test]
    fn test_update_overwrites() {
        let store = SessionStore::new();
        store.insert_new(ProgressSnapshot::starting("s1")).unwrap();
        store.update(ProgressSnapshot::running("s1", "one")).unwrap();
        store.update(ProgressSnapshot::running("s1", "two")).unwrap();
        assert_eq!(store.get("s1").unwrap(), ProgressSnapshot::running("s1", "two"));
    }

    #[test]
    fn test_update_unknown_session() {
        let store = SessionStore::new();
        let err = store.update(ProgressSnapshot::running("nope", "x")).unwrap_err();
        assert_eq!(err, StoreError::UnknownSession("nope".into()));
    }

    #[test]
    fn test_terminal_snapshot_is_final() {
        let store = SessionStore::new();
        store.insert_new(ProgressSnapshot::starting("s1")).unwrap();
        store.update(ProgressSnapshot::succeeded("s1", "/tmp/s1.pdf")).unwrap();

        let err = store.update(ProgressSnapshot::running("s1", "late")).unwrap_err();
        assert_eq!(err, StoreError::Terminal("s1".into()));
        let err = store.update(ProgressSnapshot::failed("s1", "late")).unwrap_err();
        assert_eq!(err, StoreError::Terminal("s1".into()));

        assert_eq!(store.get("s1").unwrap().artifact_path(), Some("/tmp/s1.pdf"));
    }

    #[test]
    fn test_remove_terminal_older_than_keeps_running() {
        let store = SessionStore::new();
        store.insert_new(ProgressSnapshot::starting("running")).unwrap();
        store.insert_new(ProgressSnapshot::starting("done")).unwrap();
        store.update(ProgressSnapshot::failed("done", "x")).unwrap();

        assert_eq!(store.remove_terminal_older_than(Duration::from_secs(3600)), 0);
        assert_eq!(store.remove_terminal_older_than(Duration::ZERO), 1);
        assert!(store.contains("running"));
        assert!(!store.contains("done"));
    }

    #[test]
    fn test_concurrent_writers_on_distinct_sessions() {
        let store = Arc::new(SessionStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let id = format!("s{i}");
                    store.insert_new(ProgressSnapshot::starting(id.clone())).unwrap();
                    for step in 0..50 {
                        store
                            .update(ProgressSnapshot::running(id.clone(), format!("step {step}")))
                            .unwrap();
                    }
                    store.update(ProgressSnapshot::succeeded(id.clone(), format!("/tmp/{id}.pdf"))).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.len(), 8);
        for i in 0..8 {
            let snap = store.get(&format!("s{i}")).unwrap();
            assert!(snap.is_terminal());
            assert_eq!(snap.artifact_path(), Some(format!("/tmp/s{i}.pdf").as_str()));
        }
    }
}
