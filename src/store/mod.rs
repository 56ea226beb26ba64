//! In-memory session storage.
//!
//! The store owns every [`Session`]. Handles are cheap to clone and share one
//! underlying map, so the presenter and the background runner see the same
//! data. Only the runner changes the status of a session while it executes.

use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use log::{debug, info};

use crate::{
    error::SessionError,
    models::{Session, SessionStatus},
};

struct StoreInner {
    sessions: BTreeMap<u64, Session>,
    next_id: u64,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner {
                sessions: BTreeMap::new(),
                next_id: 1,
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn create(
        &self,
        title: &str,
        focus_minutes: u32,
        break_minutes: u32,
        rounds: u32,
    ) -> Result<Session, SessionError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SessionError::Validation("title must not be empty".into()));
        }
        for (field, value) in [
            ("focus minutes", focus_minutes),
            ("break minutes", break_minutes),
            ("rounds", rounds),
        ] {
            if value < 1 {
                return Err(SessionError::Validation(format!(
                    "{field} must be at least 1"
                )));
            }
        }

        let mut guard = self.write();
        let session = Session {
            id: guard.next_id,
            title: title.to_string(),
            focus_minutes,
            break_minutes,
            rounds,
            status: SessionStatus::Pending,
        };
        guard.sessions.insert(session.id, session.clone());
        guard.next_id += 1;

        info!("created session {} ({})", session.id, session.title);
        Ok(session)
    }

    pub fn get(&self, id: u64) -> Option<Session> {
        self.read().sessions.get(&id).cloned()
    }

    /// All sessions, ordered by id.
    pub fn list(&self) -> Vec<Session> {
        self.read().sessions.values().cloned().collect()
    }

    pub fn pending(&self) -> Vec<Session> {
        self.with_status(SessionStatus::Pending)
    }

    pub fn completed(&self) -> Vec<Session> {
        self.with_status(SessionStatus::Completed)
    }

    fn with_status(&self, status: SessionStatus) -> Vec<Session> {
        self.read()
            .sessions
            .values()
            .filter(|session| session.status == status)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes a session. Returns `Ok(false)` when the id is unknown.
    ///
    /// A running session cannot be deleted.
    pub fn delete(&self, id: u64) -> Result<bool, SessionError> {
        let mut guard = self.write();
        match guard.sessions.get(&id).map(|session| session.status) {
            None => Ok(false),
            Some(SessionStatus::Running) => Err(SessionError::InvalidState {
                id,
                status: SessionStatus::Running,
            }),
            Some(_) => {
                guard.sessions.remove(&id);
                info!("deleted session {id}");
                Ok(true)
            }
        }
    }

    /// Reserved for the session runner.
    pub(crate) fn set_status(&self, id: u64, status: SessionStatus) -> Result<(), SessionError> {
        let mut guard = self.write();
        let session = guard
            .sessions
            .get_mut(&id)
            .ok_or(SessionError::NotFound(id))?;
        debug!("session {id}: {} -> {status}", session.status);
        session.status = status;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_assigns_sequential_ids_and_trims_title() {
        let store = SessionStore::new();
        let first = store.create("  Write report ", 25, 5, 4).unwrap();
        let second = store.create("Read", 50, 10, 1).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.title, "Write report");
        assert_eq!(first.status, SessionStatus::Pending);
    }

    #[test]
    fn create_rejects_zero_minutes_and_blank_titles() {
        let store = SessionStore::new();

        assert!(matches!(
            store.create("Focus", 0, 5, 1),
            Err(SessionError::Validation(_))
        ));
        assert!(matches!(
            store.create("Focus", 25, 0, 1),
            Err(SessionError::Validation(_))
        ));
        assert!(matches!(
            store.create("Focus", 25, 5, 0),
            Err(SessionError::Validation(_))
        ));
        assert!(matches!(
            store.create("   ", 25, 5, 1),
            Err(SessionError::Validation(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let store = SessionStore::new();
        let first = store.create("a", 1, 1, 1).unwrap();
        assert!(store.delete(first.id).unwrap());

        let second = store.create("b", 1, 1, 1).unwrap();
        assert_eq!(second.id, 2);
    }

    #[test]
    fn list_is_ordered_by_id() {
        let store = SessionStore::new();
        for title in ["a", "b", "c"] {
            store.create(title, 1, 1, 1).unwrap();
        }
        store.delete(2).unwrap();

        let ids: Vec<u64> = store.list().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn delete_refuses_running_sessions() {
        let store = SessionStore::new();
        let session = store.create("a", 1, 1, 1).unwrap();
        store.set_status(session.id, SessionStatus::Running).unwrap();

        assert_eq!(
            store.delete(session.id),
            Err(SessionError::InvalidState {
                id: session.id,
                status: SessionStatus::Running,
            })
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_removes_pending_and_completed_sessions() {
        let store = SessionStore::new();
        let pending = store.create("a", 1, 1, 1).unwrap();
        let completed = store.create("b", 1, 1, 1).unwrap();
        store
            .set_status(completed.id, SessionStatus::Completed)
            .unwrap();

        assert!(store.delete(pending.id).unwrap());
        assert!(store.delete(completed.id).unwrap());
        assert!(store.list().is_empty());
        assert!(!store.delete(42).unwrap());
    }

    #[test]
    fn status_filters() {
        let store = SessionStore::new();
        store.create("a", 1, 1, 1).unwrap();
        let done = store.create("b", 1, 1, 1).unwrap();
        store.set_status(done.id, SessionStatus::Completed).unwrap();

        assert_eq!(store.pending().len(), 1);
        assert_eq!(store.completed()[0].id, done.id);
        assert_eq!(
            store.set_status(99, SessionStatus::Running),
            Err(SessionError::NotFound(99))
        );
    }
}
