use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};
use url::Url;

/// Inference endpoint used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "https://ai-bot-mmlh.onrender.com/ai";

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub endpoint: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the user config directory; a missing file gives defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Pick the endpoint: an explicit override first, then this config,
    /// then [`DEFAULT_ENDPOINT`].
    pub fn resolve_endpoint(&self, override_endpoint: Option<&str>) -> Result<Url> {
        let raw = override_endpoint
            .or(self.endpoint.as_deref())
            .unwrap_or(DEFAULT_ENDPOINT);

        let url = Url::parse(raw).with_context(|| format!("Invalid endpoint URL: {raw}"))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(anyhow!("Unsupported endpoint scheme '{other}' in {raw}")),
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("ai-chatbot").join("config.json"))
    }
}
