use crate::config::AppConfig;
use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = ".config/padmapper";
const CONFIG_FILE: &str = "config.toml";

/// Reads and writes the configuration file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store at `<home>/.config/padmapper/config.toml`
    pub fn new() -> Self {
        let mut path = get_home_dir();
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        Self { path }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file, writing defaults first if it does not exist yet
    pub async fn load_or_default(&self) -> Result<AppConfig> {
        if !tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            info!(
                "No configuration at {}, writing defaults",
                self.path.display()
            );
            let config = AppConfig::default();
            self.save(&config).await?;
            return Ok(config);
        }

        self.load().await
    }

    pub async fn load(&self) -> Result<AppConfig> {
        debug!("Loading configuration from {}", self.path.display());
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", self.path.display(), e))?;

        let config: AppConfig =
            toml::from_str(&content).map_err(|e| eyre!("Failed to parse config file: {}", e))?;
        config
            .engine
            .validate()
            .map_err(|e| eyre!("Rejected config file {}: {}", self.path.display(), e))?;

        info!("Configuration loaded from {}", self.path.display());
        Ok(config)
    }

    pub async fn save(&self, config: &AppConfig) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }

        let content = toml::to_string_pretty(config)
            .map_err(|e| eyre!("Failed to serialize configuration: {}", e))?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file {}: {}", self.path.display(), e))?;

        info!("Configuration saved to {}", self.path.display());
        Ok(())
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

fn get_home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    })
}
