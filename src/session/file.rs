use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use super::{Session, SessionError, SessionStore};

/// Stores each session as `<dir>/<uuid>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Open the store, creating its directory if needed.
    pub async fn open(base_dir: impl AsRef<Path>) -> Result<Self, SessionError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).await?;
        tracing::debug!("Session store directory: {:?}", base_dir);
        Ok(Self { base_dir })
    }

    fn session_path(&self, id: &Uuid) -> PathBuf {
        // Uuid's Display form is hex and dashes only, so no traversal is possible.
        self.base_dir.join(format!("{}.json", id.as_hyphenated()))
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn load(&self, id: &Uuid) -> Result<Option<Session>, SessionError> {
        let path = self.session_path(id);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let session: Session = serde_json::from_str(&content)?;
        if session.is_expired_at(Utc::now()) {
            self.destroy(id).await?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn save(&self, session: &Session) -> Result<(), SessionError> {
        let path = self.session_path(&session.id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(session)?).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn destroy(&self, id: &Uuid) -> Result<(), SessionError> {
        match fs::remove_file(self.session_path(id)).await {
            Ok(()) => {
                tracing::debug!("Deleted session file for {}", id);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn purge_expired(&self) -> Result<usize, SessionError> {
        let now = Utc::now();
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.base_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            let session: Session = match serde_json::from_str(&content) {
                Ok(session) => session,
                Err(e) => {
                    warn!("Skipping unreadable session file {:?}: {}", path, e);
                    continue;
                }
            };
            if session.is_expired_at(now) {
                self.destroy(&session.id).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
