mod cookie;
mod file;
mod memory;
mod middleware;

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SessionBackend;

pub use cookie::{find_cookie, set_cookie_header, sign_session_id, verify_session_id};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use middleware::track_session;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session record is corrupt: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Per-visitor record attached to every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub views: u64,
    /// Set by the external auth module once the visitor logs in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// `now + ttl`, saturating at the latest representable instant.
fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl Session {
    pub fn new(ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            views: 0,
            user_id: None,
            created_at: now,
            expires_at: expiry_after(now, ttl),
        }
    }

    /// Count one more view and push the expiry forward.
    pub fn touch(&mut self, ttl: Duration) {
        self.views += 1;
        self.expires_at = expiry_after(Utc::now(), ttl);
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn user_label(&self) -> &str {
        self.user_id.as_deref().unwrap_or("(unauthenticated)")
    }
}

/// Persistence for sessions. Expired sessions are never returned by `load`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &Uuid) -> Result<Option<Session>, SessionError>;

    async fn save(&self, session: &Session) -> Result<(), SessionError>;

    async fn destroy(&self, id: &Uuid) -> Result<(), SessionError>;

    /// Drop every session that has expired. Returns how many were removed.
    async fn purge_expired(&self) -> Result<usize, SessionError>;
}

pub async fn open_store(backend: &SessionBackend) -> Result<Arc<dyn SessionStore>, SessionError> {
    match backend {
        SessionBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        SessionBackend::File(dir) => Ok(Arc::new(FileStore::open(dir).await?)),
    }
}

/// Periodically purge expired sessions until the store is dropped.
pub fn spawn_sweeper(store: &Arc<dyn SessionStore>, every: Duration) -> tokio::task::JoinHandle<()> {
    let store: Weak<dyn SessionStore> = Arc::downgrade(store);
    info!("Sweeping expired sessions every {}s", every.as_secs());

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let Some(store) = store.upgrade() else {
                debug!("Session store dropped, stopping sweeper");
                break;
            };
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => info!("Purged {} expired sessions", removed),
                Err(e) => warn!("Session sweep failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_unviewed() {
        let session = Session::new(Duration::from_secs(60));
        assert_eq!(session.views, 0);
        assert_eq!(session.user_label(), "(unauthenticated)");
        assert!(!session.is_expired_at(Utc::now()));
    }

    #[test]
    fn touch_counts_views_and_extends_expiry() {
        let mut session = Session::new(Duration::from_secs(1));
        let first_expiry = session.expires_at;
        session.touch(Duration::from_secs(3600));
        assert_eq!(session.views, 1);
        assert!(session.expires_at > first_expiry);
    }

    #[test]
    fn huge_ttl_saturates_instead_of_overflowing() {
        let mut session = Session::new(Duration::from_secs(10_000_000_000_000));
        assert_eq!(session.expires_at, DateTime::<Utc>::MAX_UTC);

        session.touch(Duration::from_secs(u64::MAX));
        assert_eq!(session.views, 1);
        assert_eq!(session.expires_at, DateTime::<Utc>::MAX_UTC);
    }

    #[tokio::test]
    async fn sweeper_reclaims_expired_sessions() {
        let memory = Arc::new(MemoryStore::new());
        for _ in 0..3 {
            let mut session = Session::new(Duration::from_secs(60));
            session.expires_at = Utc::now() - chrono::Duration::seconds(1);
            memory.save(&session).await.unwrap();
        }
        let live = Session::new(Duration::from_secs(60));
        memory.save(&live).await.unwrap();

        let store: Arc<dyn SessionStore> = memory.clone();
        let sweeper = spawn_sweeper(&store, Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(memory.len(), 1);
        assert_eq!(store.load(&live.id).await.unwrap(), Some(live));

        drop(store);
        drop(memory);
        tokio::time::timeout(Duration::from_secs(1), sweeper)
            .await
            .expect("sweeper should stop once the store is dropped")
            .unwrap();
    }

    #[test]
    fn expiry_is_inclusive() {
        let session = Session::new(Duration::from_secs(10));
        assert!(session.is_expired_at(session.expires_at));
    }
}
