use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Base URL of the analysis service.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Request timeout in seconds. A stalled submission fails as a
    /// transport error instead of pinning the busy state forever.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Client-side cap matching the service's request body limit, in MB.
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,

    /// Route similarity submissions to the legacy /upload endpoint.
    #[serde(default)]
    pub legacy_upload: bool,

    /// Microphone capture rate in Hz (mono, 16-bit PCM).
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Live frequency bars while recording.
    #[serde(default = "default_visualizer")]
    pub visualizer: bool,

    /// Decorative starfield while idle.
    #[serde(default = "default_starfield")]
    pub starfield: bool,
}

fn default_api_base() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_upload_mb() -> u64 {
    16
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_visualizer() -> bool {
    true
}

fn default_starfield() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout: default_timeout(),
            max_upload_mb: default_max_upload_mb(),
            legacy_upload: false,
            sample_rate: default_sample_rate(),
            visualizer: default_visualizer(),
            starfield: default_starfield(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.config/vocary/config.json)
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!(
                "Config file not found at {:?}, creating default config",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        tracing::info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved config to {:?}", config_path);
        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(dir)
        } else {
            let home = std::env::var("HOME").context("HOME environment variable not set")?;
            PathBuf::from(home).join(".config")
        };

        Ok(config_dir.join("vocary").join("config.json"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "api_base must be an http(s) URL, got {:?}",
                self.api_base
            ));
        }

        if self.timeout == 0 {
            return Err(anyhow::anyhow!("timeout must be at least 1 second"));
        }

        if self.max_upload_mb == 0 {
            return Err(anyhow::anyhow!("max_upload_mb must be at least 1"));
        }

        if self.sample_rate < 8000 {
            return Err(anyhow::anyhow!(
                "sample_rate must be at least 8000 Hz, got {}",
                self.sample_rate
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout)
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }
}
