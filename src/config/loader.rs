//! Configuration loading and environment overrides.

use std::path::PathBuf;

use super::{Config, Settings};

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "TED_API_URL";

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
}

/// Load settings from the config file (explicit or discovered), then apply
/// environment overrides.
///
/// Only an explicit config path that cannot be read or parsed is an error.
pub async fn load_settings(options: LoadOptions) -> Result<(Settings, Config), String> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(url) = std::env::var(API_URL_ENV).ok().filter(|s| !s.is_empty()) {
        tracing::debug!("Using {} from environment: {}", API_URL_ENV, url);
        settings.base_url = url;
    }

    Ok((settings, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn explicit_path_is_used_and_paths_resolve_next_to_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tedquire.json");
        std::fs::write(&path, r#"{"page_size": 75, "output_dir": "out"}"#).unwrap();

        let (settings, config) = load_settings(LoadOptions {
            config_path: Some(path.clone()),
        })
        .await
        .unwrap();

        assert_eq!(config.source_path, Some(path));
        assert_eq!(settings.page_size, 75);
        assert_eq!(settings.output_dir, dir.path().join("out"));
    }

    #[tokio::test]
    async fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_settings(LoadOptions {
            config_path: Some(dir.path().join("absent.toml")),
        })
        .await;

        assert!(result.is_err());
    }
}
