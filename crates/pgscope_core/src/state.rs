//! Shared registry of open sessions.
//!
//! Sessions are not thread-safe on their own; the registry hands each one
//! out behind a mutex so concurrent callers serialize on it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::services::Session;

/// A session as stored in the registry.
pub type SharedSession = Arc<Mutex<Session>>;

/// Thread-safe map of open sessions keyed by id.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and return its id.
    pub fn insert(&self, session: Session) -> Uuid {
        let id = Uuid::new_v4();
        tracing::debug!(session_id = %id, host = %session.host(), "Registering session");
        self.sessions.write().insert(id, Arc::new(Mutex::new(session)));
        id
    }

    /// Get a session by id.
    pub fn get(&self, id: &Uuid) -> Option<SharedSession> {
        self.sessions.read().get(id).cloned()
    }

    /// Remove a session and close its connection.
    pub fn remove(&self, id: &Uuid) -> bool {
        let Some(session) = self.sessions.write().remove(id) else {
            return false;
        };
        session.lock().close();
        tracing::debug!(session_id = %id, "Removed session");
        true
    }

    /// Ids of all registered sessions.
    pub fn ids(&self) -> Vec<Uuid> {
        self.sessions.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Close and drop every session.
    pub fn close_all(&self) {
        let sessions: Vec<_> = self.sessions.write().drain().collect();
        for (id, session) in sessions {
            session.lock().close();
            tracing::debug!(session_id = %id, "Closed session");
        }
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry").field("sessions", &self.len()).finish()
    }
}
