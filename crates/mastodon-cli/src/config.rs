//! Configuration file handling for mastodon-cli

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_SERVER: &str = "https://mastodon.social";

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Default server URL
    pub server: Option<String>,
    /// OAuth client id of the registered application
    pub client_id: Option<String>,
    /// OAuth client secret of the registered application
    pub client_secret: Option<String>,
    /// Access token from a previous login
    pub access_token: Option<String>,
    /// Default output format
    pub output: Option<String>,
    /// Disable colored output
    pub no_color: Option<bool>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write configuration to a specific path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("mastodon-cli");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(&self, args: &ConfigArgs, output: Option<&str>) -> MergedConfig {
        MergedConfig {
            server: args
                .server
                .clone()
                .or_else(|| self.server.clone())
                .unwrap_or_else(|| DEFAULT_SERVER.to_string()),
            client_id: args
                .client_id
                .clone()
                .or_else(|| self.client_id.clone())
                .unwrap_or_default(),
            client_secret: args
                .client_secret
                .clone()
                .or_else(|| self.client_secret.clone())
                .unwrap_or_default(),
            access_token: args
                .access_token
                .clone()
                .or_else(|| self.access_token.clone()),
            output: output
                .map(String::from)
                .or_else(|| self.output.clone())
                .unwrap_or_else(|| "table".to_string()),
            no_color: args.no_color || self.no_color.unwrap_or(false),
        }
    }
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigArgs {
    pub server: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub access_token: Option<String>,
    pub no_color: bool,
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub server: String,
    pub client_id: String,
    pub client_secret: String,
    pub access_token: Option<String>,
    pub output: String,
    pub no_color: bool,
}

impl MergedConfig {
    /// Client configuration for the library
    pub fn client_config(&self) -> mastodon_client::Config {
        let config = mastodon_client::Config::new(
            self.server.clone(),
            self.client_id.clone(),
            self.client_secret.clone(),
        );
        match &self.access_token {
            Some(token) => config.with_access_token(token.clone()),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            server: Some("https://example.social".into()),
            client_id: Some("foo".into()),
            client_secret: Some("bar".into()),
            access_token: Some("zoo".into()),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "server = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_args_override_file() {
        let config = Config {
            server: Some("https://file.social".into()),
            client_id: Some("file-id".into()),
            access_token: Some("file-token".into()),
            output: Some("json".into()),
            ..Default::default()
        };
        let args = ConfigArgs {
            server: Some("https://args.social".into()),
            access_token: Some("args-token".into()),
            ..Default::default()
        };

        let merged = config.merge_with_args(&args, None);

        assert_eq!(merged.server, "https://args.social");
        assert_eq!(merged.client_id, "file-id");
        assert_eq!(merged.client_secret, "");
        assert_eq!(merged.access_token.as_deref(), Some("args-token"));
        assert_eq!(merged.output, "json");
        assert!(!merged.no_color);
    }

    #[test]
    fn test_defaults_without_file() {
        let merged = Config::default().merge_with_args(&ConfigArgs::default(), Some("csv"));

        assert_eq!(merged.server, DEFAULT_SERVER);
        assert_eq!(merged.output, "csv");
        assert_eq!(merged.client_config().access_token, None);
    }
}
