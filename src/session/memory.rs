use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use super::{Session, SessionError, SessionStore};

/// Process-local store. Sessions do not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: DashMap<Uuid, Session>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, id: &Uuid) -> Result<Option<Session>, SessionError> {
        let session = self.sessions.get(id).map(|e| e.value().clone());
        match session {
            Some(session) if session.is_expired_at(Utc::now()) => {
                self.sessions.remove(id);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn save(&self, session: &Session) -> Result<(), SessionError> {
        self.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn destroy(&self, id: &Uuid) -> Result<(), SessionError> {
        self.sessions.remove(id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, SessionError> {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired_at(now));
        Ok(before.saturating_sub(self.sessions.len()))
    }
}
