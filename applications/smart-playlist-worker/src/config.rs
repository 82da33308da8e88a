/// Worker configuration
use crate::error::{Result, WorkerError};
use serde::{Deserialize, Serialize};
use soul_smart_playlists::SmartPlaylistConfig;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default)]
    pub engine: SmartPlaylistConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

impl WorkerConfig {
    /// Load configuration from `path` (default `config.toml`, if present) and
    /// `SOUL_`-prefixed environment variables such as `SOUL_ENGINE__WORKERS`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        let config_path = path.map_or_else(|| PathBuf::from("config.toml"), Path::to_path_buf);
        if config_path.exists() {
            settings = settings.add_source(config::File::from(config_path));
        } else if path.is_some() {
            return Err(WorkerError::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("SOUL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| WorkerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| WorkerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.database_url.is_empty() {
            return Err(WorkerError::Config(
                "Database URL is required (set SOUL_STORAGE__DATABASE_URL)".to_string(),
            ));
        }

        self.engine.validate().map_err(WorkerError::Config)
    }
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        database_url: default_database_url(),
    }
}

fn default_database_url() -> String {
    "sqlite://./data/soul.db".to_string()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            storage: default_storage(),
            engine: SmartPlaylistConfig::default(),
        }
    }
}
