//! Configuration management for tidyday
//!
//! Stores settings in ~/.config/tidyday/config.json

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tidyday_engine::llm::models::{
    default_models, DEFAULT_ATTEMPT_TIMEOUT_SECS, DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS,
    DEFAULT_TEMPERATURE,
};
use tidyday_engine::{AssistantService, ChainSettings, ProviderChain};
use tracing::{debug, warn};

const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
const ENV_MODELS: &str = "TIDYDAY_MODELS";
const ENV_ENDPOINT: &str = "TIDYDAY_ENDPOINT";
const ENV_ATTEMPT_TIMEOUT: &str = "TIDYDAY_ATTEMPT_TIMEOUT_SECS";

const MAX_TEMPERATURE: f32 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat-completions URL
    pub endpoint: String,
    /// Failover order, first to last
    pub models: Vec<String>,
    pub attempt_timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            models: default_models(),
            attempt_timeout_secs: DEFAULT_ATTEMPT_TIMEOUT_SECS,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            api_key: None,
        }
    }
}

impl Config {
    /// Repair values a hand-edited file may get wrong.
    pub fn sanitize(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.models = self
            .models
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty() && seen.insert(m.clone()))
            .collect();
        if self.models.is_empty() {
            self.models = default_models();
        }

        if self.endpoint.trim().is_empty() {
            self.endpoint = DEFAULT_ENDPOINT.to_string();
        }
        self.temperature = if self.temperature.is_finite() {
            self.temperature.clamp(0.0, MAX_TEMPERATURE)
        } else {
            DEFAULT_TEMPERATURE
        };
        if self.attempt_timeout_secs == 0 {
            self.attempt_timeout_secs = DEFAULT_ATTEMPT_TIMEOUT_SECS;
        }
        if self.max_tokens == 0 {
            self.max_tokens = DEFAULT_MAX_TOKENS;
        }
        if self
            .api_key
            .as_deref()
            .is_some_and(|key| key.trim().is_empty())
        {
            self.api_key = None;
        }
    }

    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tidyday"))
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load config from disk with environment overrides, or return defaults.
    pub fn load() -> Self {
        let mut config = match Self::config_path() {
            Some(path) => Self::load_or_recover(&path),
            None => Self::default(),
        };
        config.apply_env_overrides();
        config
    }

    /// Load `path`, falling back to defaults when it is missing or corrupt.
    ///
    /// A corrupt file is moved aside so the next save does not destroy it.
    pub fn load_or_recover(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(config) => config,
            Err(err) => {
                let backup = preserve_corrupt_config(path)
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "none".to_string());
                let error = format!("{:#}", err);
                warn!(
                    path = %path.display(),
                    backup = %backup,
                    error = %error,
                    "config file was unreadable; loaded defaults"
                );
                Self::default()
            }
        }
    }

    /// Load `path` strictly. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        let mut config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.sanitize();
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("Could not determine config directory")?;
        self.save_to(&path)
    }

    /// Save config to `path`, replacing any existing file atomically.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let mut sanitized = self.clone();
        sanitized.sanitize();

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(dir, fs::Permissions::from_mode(0o700)) {
                    warn!(error = %e, "failed to set config directory permissions");
                }
            }
        }

        let content =
            serde_json::to_string_pretty(&sanitized).context("Failed to serialize config")?;
        write_config_atomic(path, &content).context("Failed to write config")
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = var(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(models) = var(ENV_MODELS) {
            self.models = models
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(endpoint) = var(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Some(raw) = var(ENV_ATTEMPT_TIMEOUT) {
            match raw.parse::<u64>() {
                Ok(secs) => self.attempt_timeout_secs = secs,
                Err(_) => warn!(value = %raw, "ignoring invalid {}", ENV_ATTEMPT_TIMEOUT),
            }
        }
        self.sanitize();
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Project into the provider chain's settings.
    pub fn chain_settings(&self) -> ChainSettings {
        ChainSettings {
            models: self.models.clone(),
            attempt_timeout: Duration::from_secs(self.attempt_timeout_secs),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Assistant over HTTP using this configuration.
    pub fn assistant(&self) -> AssistantService {
        if !self.has_api_key() {
            warn!(
                config = %Self::config_location(),
                "no API key configured; set {} or api_key in the config file",
                ENV_API_KEY
            );
        }
        AssistantService::new(ProviderChain::over_http(
            self.chain_settings(),
            self.endpoint.clone(),
            self.api_key.clone(),
        ))
    }

    /// Get the config file location for display
    pub fn config_location() -> String {
        Self::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.config/tidyday/config.json".to_string())
    }
}

/// Move a corrupt file aside as `config.json.corrupt-<timestamp>`.
fn preserve_corrupt_config(path: &Path) -> Option<PathBuf> {
    if !path.exists() {
        return None;
    }
    let file_name = path.file_name()?.to_string_lossy().into_owned();
    let corrupt_path = path.with_file_name(format!(
        "{}.corrupt-{}",
        file_name,
        Utc::now().format("%Y%m%d%H%M%S")
    ));
    match fs::rename(path, &corrupt_path) {
        Ok(()) => Some(corrupt_path),
        Err(err) => {
            warn!(error = %err, "failed to back up corrupt config");
            None
        }
    }
}

fn write_config_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)
        .with_context(|| format!("Failed to open {}", tmp_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = file.set_permissions(fs::Permissions::from_mode(0o600)) {
            warn!(error = %e, "failed to set temp config file permissions");
        }
    }

    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    drop(file);

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err).context("Failed to replace config file");
    }
    Ok(())
}
