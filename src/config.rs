use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use anyhow::Result;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

/// Startup configuration, loaded and validated once before the server binds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system_config: SystemConfig,
    #[serde(default)]
    pub session_config: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_intro_dir")]
    pub intro_dir: String,
    #[serde(default = "default_outro_dir")]
    pub outro_dir: String,
    #[serde(default = "default_public_dir")]
    pub public_dir: String,
    #[serde(default = "default_views_dir")]
    pub views_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Connection string of the session store: `memory://` or `file://<dir>`.
    #[serde(default)]
    pub database_url: String,
    #[serde(default)]
    pub session_secret: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// How often expired sessions are swept from the store.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

/// Where sessions are kept, parsed from `database_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    File(PathBuf),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required configuration value {0} is not set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("unsupported session store url: {0}")]
    UnsupportedSessionStore(String),
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_intro_dir() -> String {
    "audio/intro".to_string()
}

fn default_outro_dir() -> String {
    "audio/outro".to_string()
}

fn default_public_dir() -> String {
    "public".to_string()
}

fn default_views_dir() -> String {
    "views".to_string()
}

fn default_cookie_name() -> String {
    "affapp.sid".to_string()
}

fn default_ttl_secs() -> u64 {
    14 * 24 * 60 * 60
}

fn default_purge_interval_secs() -> u64 {
    10 * 60
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            intro_dir: default_intro_dir(),
            outro_dir: default_outro_dir(),
            public_dir: default_public_dir(),
            views_dir: default_views_dir(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            session_secret: String::new(),
            cookie_name: default_cookie_name(),
            ttl_secs: default_ttl_secs(),
            purge_interval_secs: default_purge_interval_secs(),
        }
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }

    pub fn backend(&self) -> Result<SessionBackend, ConfigError> {
        let url = self.database_url.trim();
        if url == "memory://" {
            return Ok(SessionBackend::Memory);
        }
        match url.strip_prefix("file://") {
            Some(dir) if !dir.is_empty() => Ok(SessionBackend::File(PathBuf::from(dir))),
            _ => Err(ConfigError::UnsupportedSessionStore(url.to_string())),
        }
    }
}

impl Config {
    /// Load configuration from a YAML or JSON file, substituting `${VAR}`
    /// placeholders from the environment.
    pub fn load(path: &str) -> Result<Self> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// Like [`Config::load`], resolving placeholders through `lookup`.
    pub fn load_with<F>(path: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let content = fs::read_to_string(path)?;
        let content = substitute_vars(&content, lookup);

        let path_lower = path.to_lowercase();
        if path_lower.ends_with(".json") {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(serde_yaml::from_str(&content)?)
        }
    }

    /// Find and load the first readable config file, fall back to defaults,
    /// then apply environment overrides and validate.
    ///
    /// Returns the config together with the file it was read from, if any.
    pub fn resolve() -> Result<(Self, Option<String>)> {
        dotenvy::dotenv().ok();

        let candidates: Vec<String> = vec![
            std::env::var("CONFIG_PATH").ok(),
            Some("conf.yaml".to_string()),
            Some("conf.yml".to_string()),
            Some("conf.json".to_string()),
        ]
        .into_iter()
        .flatten()
        .collect();

        let mut config = None;
        let mut loaded_path = None;

        for path in candidates {
            if !Path::new(&path).exists() {
                debug!("No config file at {}", path);
                continue;
            }
            match Config::load(&path) {
                Ok(cfg) => {
                    config = Some(cfg);
                    loaded_path = Some(path);
                    break;
                }
                Err(e) => {
                    warn!("Failed to load config from {}: {}", path, e);
                    continue;
                }
            }
        }

        let mut config = config.unwrap_or_default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok((config, loaded_path))
    }

    /// Apply `PORT`, `DATABASE_URL` and `SESSION_SECRET` overrides.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.system_config.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "PORT", value: port.clone() })?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.session_config.database_url = url;
        }
        if let Some(secret) = lookup("SESSION_SECRET") {
            self.session_config.session_secret = secret;
        }
        Ok(())
    }

    /// Values still holding an unresolved `${VAR}` count as missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let session = &self.session_config;
        if is_unset(&session.database_url) {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if is_unset(&session.session_secret) {
            return Err(ConfigError::Missing("SESSION_SECRET"));
        }
        let ttl_in_range = chrono::Duration::from_std(session.ttl())
            .ok()
            .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
            .is_some();
        if session.ttl_secs == 0 || !ttl_in_range {
            return Err(ConfigError::InvalidValue {
                key: "ttl_secs",
                value: session.ttl_secs.to_string(),
            });
        }
        if session.purge_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "purge_interval_secs",
                value: session.purge_interval_secs.to_string(),
            });
        }
        session.backend()?;
        Ok(())
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{(\w+)\}").expect("static pattern"))
}

fn is_unset(value: &str) -> bool {
    value.trim().is_empty() || placeholder_pattern().is_match(value)
}

/// Replace `${VAR}` placeholders; unknown variables are left untouched.
pub fn substitute_vars<F>(content: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    placeholder_pattern()
        .replace_all(content, |caps: &regex::Captures| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_fail_validation_without_secrets() {
        let config = Config::default();
        assert_eq!(config.system_config.port, 3000);
        assert_eq!(config.validate(), Err(ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn missing_session_secret_is_reported() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("DATABASE_URL", "memory://")])).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::Missing("SESSION_SECRET")));
    }

    #[test]
    fn overrides_fill_required_values() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("PORT", "8080"),
                ("DATABASE_URL", "file:///tmp/sessions"),
                ("SESSION_SECRET", "hunter2"),
            ]))
            .unwrap();

        assert_eq!(config.system_config.port, 8080);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.session_config.backend(),
            Ok(SessionBackend::File(PathBuf::from("/tmp/sessions")))
        );
    }

    #[test]
    fn bad_port_is_rejected() {
        let mut config = Config::default();
        let err = config.apply_overrides(env(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidValue { key: "PORT", value: "eighty".to_string() });
    }

    #[test]
    fn unknown_store_scheme_is_rejected() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("DATABASE_URL", "mongodb://localhost/affapp"),
                ("SESSION_SECRET", "s"),
            ]))
            .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::UnsupportedSessionStore(_))));
    }

    fn example_config() -> String {
        concat!(env!("CARGO_MANIFEST_DIR"), "/conf.example.yaml").to_string()
    }

    #[test]
    fn unresolved_placeholders_count_as_missing() {
        let config = Config::load_with(&example_config(), env(&[])).unwrap();
        assert_eq!(config.session_config.database_url, "${DATABASE_URL}");
        assert_eq!(config.validate(), Err(ConfigError::Missing("DATABASE_URL")));

        let config =
            Config::load_with(&example_config(), env(&[("DATABASE_URL", "memory://")])).unwrap();
        assert_eq!(config.session_config.session_secret, "${SESSION_SECRET}");
        assert_eq!(config.validate(), Err(ConfigError::Missing("SESSION_SECRET")));
    }

    #[test]
    fn example_config_validates_once_variables_are_set() {
        let config = Config::load_with(
            &example_config(),
            env(&[("DATABASE_URL", "memory://"), ("SESSION_SECRET", "s3cret")]),
        )
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unrepresentable_ttl_is_rejected() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[("DATABASE_URL", "memory://"), ("SESSION_SECRET", "s")]))
            .unwrap();

        config.session_config.ttl_secs = 10_000_000_000_000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "ttl_secs", .. })
        ));

        config.session_config.ttl_secs = u64::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "ttl_secs", .. })
        ));

        config.session_config.ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_purge_interval_is_rejected() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[("DATABASE_URL", "memory://"), ("SESSION_SECRET", "s")]))
            .unwrap();
        config.session_config.purge_interval_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "purge_interval_secs", .. })
        ));
    }

    #[test]
    fn placeholders_are_substituted() {
        let out = substitute_vars(
            "secret: ${SECRET}\nother: ${NOT_SET}",
            env(&[("SECRET", "abc")]),
        );
        assert_eq!(out, "secret: abc\nother: ${NOT_SET}");
    }

    #[test]
    fn yaml_file_is_parsed_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf.yaml");
        fs::write(
            &path,
            "system_config:\n  port: 4000\n  intro_dir: clips/in\nsession_config:\n  database_url: memory://\n  session_secret: abc\n",
        )
        .unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.system_config.port, 4000);
        assert_eq!(config.system_config.intro_dir, "clips/in");
        assert_eq!(config.system_config.outro_dir, "audio/outro");
        assert_eq!(config.session_config.cookie_name, "affapp.sid");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf.json");
        fs::write(
            &path,
            r#"{"session_config": {"database_url": "memory://", "session_secret": "x", "ttl_secs": 60}}"#,
        )
        .unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.session_config.ttl(), Duration::from_secs(60));
        assert_eq!(config.session_config.backend(), Ok(SessionBackend::Memory));
    }
}
