//! Session registry for active console sessions
//!
//! Each browser tab owns one workflow session. The registry hands out
//! cloned [`WorkflowSession`] handles; closing a session stops its actor
//! and aborts its streams. Sessions nobody uses are evicted by
//! [`WorkflowSessionManager::evict_idle`].

use std::collections::HashMap;
use std::time::Duration;

use tracing::info;

use crate::application::services::{SessionError, WorkflowPorts, WorkflowSession};
use crate::domain::value_objects::SessionId;

pub struct WorkflowSessionManager {
    sessions: HashMap<SessionId, WorkflowSession>,
    ports: WorkflowPorts,
}

impl WorkflowSessionManager {
    pub fn new(ports: WorkflowPorts) -> Self {
        Self {
            sessions: HashMap::new(),
            ports,
        }
    }

    /// Start a new session; must be called within a tokio runtime
    pub fn create_session(&mut self) -> WorkflowSession {
        self.prune_closed();
        let session = WorkflowSession::spawn(SessionId::new(), self.ports.clone());
        self.sessions.insert(session.id(), session.clone());
        info!(session_id = %session.id(), sessions = self.sessions.len(), "Session created");
        session
    }

    pub fn get_session(&self, id: SessionId) -> Result<WorkflowSession, SessionError> {
        self.sessions
            .get(&id)
            .filter(|session| !session.is_closed())
            .cloned()
            .ok_or(SessionError::NotFound(id))
    }

    pub fn close_session(&mut self, id: SessionId) -> Result<(), SessionError> {
        let session = self.sessions.remove(&id).ok_or(SessionError::NotFound(id))?;
        session.close();
        info!(session_id = %id, "Session closed");
        Ok(())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Close every session, e.g. on shutdown
    pub fn close_all(&mut self) {
        for (_, session) in self.sessions.drain() {
            session.close();
        }
    }

    /// Close sessions with no attached shell and no action within `timeout`
    pub fn evict_idle(&mut self, timeout: Duration) -> Vec<SessionId> {
        let idle: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|session| session.is_closed() || session.idle_for().is_some_and(|idle| idle >= timeout))
            .map(WorkflowSession::id)
            .collect();

        for id in &idle {
            if let Some(session) = self.sessions.remove(id) {
                session.close();
                info!(session_id = %id, "Idle session evicted");
            }
        }
        idle
    }

    fn prune_closed(&mut self) {
        self.sessions.retain(|_, session| !session.is_closed());
    }
}
