//! Session manager
//!
//! Maps `SessionId` to `SessionState` behind a lock. Callers borrow a
//! session's state for the duration of a closure.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use super::state::SessionState;
use crate::config::Settings;
use crate::error::{SealboxError, SealboxResult};
use crate::models::SessionId;

/// Registry of live sessions
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, SessionState>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create a session with its own cipher key
    pub fn start(&self, settings: &Settings) -> SealboxResult<SessionId> {
        let id = SessionId::new();
        let mut sessions = self.sessions.write().map_err(|e| {
            SealboxError::Persistence(format!("Failed to acquire write lock: {}", e))
        })?;
        sessions.insert(id, SessionState::new(settings));
        debug!(session = %id, "Session created");
        Ok(id)
    }

    /// Destroy a session, returning its final state
    pub fn end(&self, id: SessionId) -> SealboxResult<Option<SessionState>> {
        let mut sessions = self.sessions.write().map_err(|e| {
            SealboxError::Persistence(format!("Failed to acquire write lock: {}", e))
        })?;
        Ok(sessions.remove(&id))
    }

    /// Run `f` with mutable access to a session's state
    pub fn with_session<T>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut SessionState) -> SealboxResult<T>,
    ) -> SealboxResult<T> {
        let mut sessions = self.sessions.write().map_err(|e| {
            SealboxError::Persistence(format!("Failed to acquire write lock: {}", e))
        })?;
        let state = sessions
            .get_mut(&id)
            .ok_or_else(|| SealboxError::UnknownSession(id.to_string()))?;
        f(state)
    }

    pub fn contains(&self, id: SessionId) -> SealboxResult<bool> {
        let sessions = self.sessions.read().map_err(|e| {
            SealboxError::Persistence(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(sessions.contains_key(&id))
    }

    pub fn len(&self) -> SealboxResult<usize> {
        let sessions = self.sessions.read().map_err(|e| {
            SealboxError::Persistence(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(sessions.len())
    }

    pub fn is_empty(&self) -> SealboxResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_start_and_end() {
        let manager = SessionManager::new();
        let id = manager.start(&Settings::default()).unwrap();

        assert!(manager.contains(id).unwrap());
        assert_eq!(manager.len().unwrap(), 1);
        assert!(manager.end(id).unwrap().is_some());
        assert!(manager.end(id).unwrap().is_none());
        assert!(manager.is_empty().unwrap());
    }

    #[test]
    fn test_with_session_mutates() {
        let manager = SessionManager::new();
        let id = manager.start(&Settings::default()).unwrap();

        manager
            .with_session(id, |s| {
                s.login("user1", Utc::now());
                Ok(())
            })
            .unwrap();

        let name = manager
            .with_session(id, |s| Ok(s.require_user()?.to_string()))
            .unwrap();
        assert_eq!(name, "user1");
    }

    #[test]
    fn test_unknown_session() {
        let manager = SessionManager::new();
        let result = manager.with_session(SessionId::new(), |_| Ok(()));
        assert!(matches!(result, Err(SealboxError::UnknownSession(_))));
    }

    #[test]
    fn test_sessions_have_independent_keys() {
        let manager = SessionManager::new();
        let a = manager.start(&Settings::default()).unwrap();
        let b = manager.start(&Settings::default()).unwrap();

        let token = manager
            .with_session(a, |s| s.cipher().encrypt(b"secret"))
            .unwrap();
        let result = manager.with_session(b, |s| s.cipher().decrypt(&token));
        assert!(matches!(result, Err(SealboxError::Decryption(_))));
    }
}
