use std::sync::Arc;

use crate::audio::{AudioDirectory, AudioSelector};
use crate::config::Config;
use crate::session::{self, SessionStore};
use crate::views::ViewRenderer;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub selector: Arc<AudioSelector>,
    pub sessions: Arc<dyn SessionStore>,
    pub views: Arc<ViewRenderer>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let backend = config.session_config.backend()?;
        let sessions = session::open_store(&backend).await?;
        session::spawn_sweeper(&sessions, config.session_config.purge_interval());
        Ok(Self::with_store(config, sessions))
    }

    /// Build state around an already opened session store. No expiry sweeper
    /// is started.
    pub fn with_store(config: Config, sessions: Arc<dyn SessionStore>) -> Self {
        let system_config = &config.system_config;
        let selector = Arc::new(AudioSelector::new(
            AudioDirectory::new(&system_config.intro_dir),
            AudioDirectory::new(&system_config.outro_dir),
        ));
        let views = Arc::new(ViewRenderer::new(&system_config.views_dir));

        Self {
            config,
            selector,
            sessions,
            views,
        }
    }
}
