//! Configuration management using the prefer crate.

mod loader;
mod settings;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use loader::{load_settings, LoadOptions, API_URL_ENV};
pub use settings::{Settings, DEFAULT_BASE_URL, DEFAULT_LANGUAGE};

/// Back-off settings for rate-limited requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct RetryConfig {
    /// First back-off in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_backoff_secs: Option<u64>,
    /// Back-off ceiling in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_backoff_secs: Option<u64>,
    /// Retries after the first rate-limited attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

impl RetryConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Minimum spacing between API requests in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_interval_ms: Option<u64>,
    /// Records per page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Fields requested from the API.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[prefer(default)]
    pub fields: Vec<String>,
    /// Preferred PDF language (ISO 639-2/B, e.g. `DEU`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Directory for exports and downloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    /// Spacing between artifact downloads in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_interval_ms: Option<u64>,
    /// Rate-limit back-off.
    #[serde(default, skip_serializing_if = "RetryConfig::is_default")]
    #[prefer(default)]
    pub retry: RetryConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer for discovery.
    /// Falls back to defaults when no config file is found or it fails to parse.
    pub async fn load() -> Self {
        match prefer::load("tedquire").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("Ignoring config file {}: {}", path.display(), e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// The format is chosen by extension: TOML, YAML, otherwise JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// The config file's parent directory, if loaded from a file.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// `~` is expanded; relative paths are joined onto `base_dir`.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Overlay the values present in this file onto `settings`.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref base_url) = self.base_url {
            settings.base_url = base_url.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(interval) = self.min_interval_ms {
            settings.min_interval_ms = interval;
        }
        if let Some(page_size) = self.page_size {
            settings.page_size = page_size;
        }
        if !self.fields.is_empty() {
            settings.fields = self.fields.clone();
        }
        if let Some(ref language) = self.language {
            settings.language = language.to_uppercase();
        }
        if let Some(ref output_dir) = self.output_dir {
            settings.output_dir = self.resolve_path(output_dir, base_dir);
        }
        if let Some(interval) = self.download_interval_ms {
            settings.download_interval_ms = interval;
        }
        if let Some(secs) = self.retry.initial_backoff_secs {
            settings.initial_backoff_secs = secs;
        }
        if let Some(secs) = self.retry.max_backoff_secs {
            settings.max_backoff_secs = secs;
        }
        if let Some(retries) = self.retry.max_retries {
            settings.max_retries = retries;
        }
    }
}
