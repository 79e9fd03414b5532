// Configuration File Support
//
// This module provides configuration file parsing for the engagement-quota tool.
// Supports TOML format with environment variable overrides.
// Configuration files are loaded from XDG config directory: ~/.config/engagement-quota/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::quota::model::{DEFAULT_MAX_COMMENTS, DEFAULT_MAX_CONSUMERS, DEFAULT_MAX_LIKES};
use crate::quota::{Budget, ConsumerRegistry};

/// Upper bound accepted for `quota.max_consumers`
pub const MAX_CONSUMERS_CEILING: usize = 20;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Budget and target limits applied to every scope
    pub quota: QuotaConfig,

    /// Where configurations are persisted
    pub store: StoreConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

/// Quota configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QuotaConfig {
    /// Likes budget per scope
    pub max_likes: u32,

    /// Comments budget per scope
    pub max_comments: u32,

    /// Maximum number of targets per scope (the feed is not counted)
    pub max_consumers: usize,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            max_likes: DEFAULT_MAX_LIKES,
            max_comments: DEFAULT_MAX_COMMENTS,
            max_consumers: DEFAULT_MAX_CONSUMERS,
        }
    }
}

impl QuotaConfig {
    pub fn budget(&self) -> Budget {
        Budget::new(self.max_likes, self.max_comments)
    }

    pub fn registry(&self) -> ConsumerRegistry {
        ConsumerRegistry::new(self.max_consumers)
    }
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one `<scope>.json` file per scope
    pub data_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().into_owned(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    match directories::ProjectDirs::from("com", "engagement-quota", "EngagementQuota") {
        Some(proj_dirs) => proj_dirs.data_dir().to_path_buf(),
        None => PathBuf::from(".engagement-quota"),
    }
}

impl Config {
    /// Load configuration from the default XDG config directory
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    /// If the config file does not exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// Environment overrides are applied whether or not the file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the resulting configuration fails validation.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file from {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file from {:?}", path))?;
            tracing::debug!("Loaded configuration from {:?}", path);
            config
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            Self::default()
        };

        let config = config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/engagement-quota/config.toml` on Linux
    pub fn config_path() -> PathBuf {
        if let Some(proj_dirs) =
            directories::ProjectDirs::from("com", "engagement-quota", "EngagementQuota")
        {
            proj_dirs.config_dir().join("config.toml")
        } else {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home)
                .join(".config")
                .join("engagement-quota")
                .join("config.toml")
        }
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Environment variables take precedence over config file values:
    /// - ENGAGEMENT_QUOTA_LOG_LEVEL
    /// - ENGAGEMENT_QUOTA_LOG_FORMAT
    /// - ENGAGEMENT_QUOTA_MAX_LIKES
    /// - ENGAGEMENT_QUOTA_MAX_COMMENTS
    /// - ENGAGEMENT_QUOTA_MAX_CONSUMERS
    /// - ENGAGEMENT_QUOTA_DATA_DIR
    ///
    /// Values that do not parse are ignored.
    fn apply_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("ENGAGEMENT_QUOTA_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("ENGAGEMENT_QUOTA_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Ok(likes) = std::env::var("ENGAGEMENT_QUOTA_MAX_LIKES") {
            if let Ok(likes) = likes.parse::<u32>() {
                self.quota.max_likes = likes;
            }
        }
        if let Ok(comments) = std::env::var("ENGAGEMENT_QUOTA_MAX_COMMENTS") {
            if let Ok(comments) = comments.parse::<u32>() {
                self.quota.max_comments = comments;
            }
        }
        if let Ok(consumers) = std::env::var("ENGAGEMENT_QUOTA_MAX_CONSUMERS") {
            if let Ok(consumers) = consumers.parse::<usize>() {
                self.quota.max_consumers = consumers;
            }
        }

        if let Ok(dir) = std::env::var("ENGAGEMENT_QUOTA_DATA_DIR") {
            self.store.data_dir = dir;
        }

        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            ),
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" | "compact" => {}
            _ => anyhow::bail!(
                "Invalid log format: {}. Must be one of: json, pretty, compact",
                self.logging.format
            ),
        }

        if self.quota.max_consumers == 0 {
            anyhow::bail!("Max consumers must be > 0");
        }
        if self.quota.max_consumers > MAX_CONSUMERS_CEILING {
            anyhow::bail!("Max consumers must be <= {}", MAX_CONSUMERS_CEILING);
        }

        if self.store.data_dir.trim().is_empty() {
            anyhow::bail!("Store data directory must not be empty");
        }

        Ok(())
    }

    /// Convert log level string to tracing::Level
    pub fn log_level(&self) -> Result<tracing::Level> {
        self.logging
            .level
            .to_lowercase()
            .parse()
            .map_err(|e| anyhow::anyhow!("Failed to parse log level: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    const ENV_VARS: [&str; 6] = [
        "ENGAGEMENT_QUOTA_LOG_LEVEL",
        "ENGAGEMENT_QUOTA_LOG_FORMAT",
        "ENGAGEMENT_QUOTA_MAX_LIKES",
        "ENGAGEMENT_QUOTA_MAX_COMMENTS",
        "ENGAGEMENT_QUOTA_MAX_CONSUMERS",
        "ENGAGEMENT_QUOTA_DATA_DIR",
    ];

    // Env vars are process-wide; tests that read or write them hold this lock
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "compact");
        assert_eq!(config.quota.max_likes, 10);
        assert_eq!(config.quota.max_comments, 10);
        assert_eq!(config.quota.max_consumers, 3);
        assert!(!config.store.data_dir.is_empty());
    }

    #[test]
    fn test_config_validation_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_max_consumers() {
        let mut config = Config::default();
        config.quota.max_consumers = 0;
        assert!(config.validate().is_err());

        config.quota.max_consumers = 25;
        assert!(config.validate().is_err());

        config.quota.max_consumers = 20;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_budget_is_valid() {
        let mut config = Config::default();
        config.quota.max_likes = 0;
        config.quota.max_comments = 0;
        assert!(config.validate().is_ok());
        assert_eq!(config.quota.budget(), Budget::new(0, 0));
    }

    #[test]
    fn test_quota_helpers() {
        let quota = QuotaConfig {
            max_likes: 7,
            max_comments: 4,
            max_consumers: 5,
        };
        assert_eq!(quota.budget(), Budget::new(7, 4));
        assert_eq!(quota.registry().max_consumers(), 5);
    }

    #[test]
    fn test_load_from_nonexistent_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().with_extension("nonexistent");
        let config = Config::load_from_path(&path);
        assert!(config.is_ok());
        assert_eq!(config.unwrap(), Config::default());
    }

    #[test]
    fn test_load_valid_toml_config() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let temp_file = NamedTempFile::new().unwrap();
        let toml_content = r#"
[logging]
level = "debug"
format = "json"

[quota]
max_likes = 20
max_comments = 15
max_consumers = 5

[store]
data_dir = "/var/lib/engagement-quota"
"#;

        fs::write(temp_file.path(), toml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.quota.budget(), Budget::new(20, 15));
        assert_eq!(config.quota.max_consumers, 5);
        assert_eq!(config.store.data_dir, "/var/lib/engagement-quota");
    }

    #[test]
    fn test_load_partial_toml_uses_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "[quota]\nmax_likes = 4\n").unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.quota.max_likes, 4);
        assert_eq!(config.quota.max_comments, 10);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_load_invalid_toml() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "invalid toml content [[[").unwrap();

        let result = Config::load_from_path(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "[quota]\nmax_consumers = 0\n").unwrap();

        assert!(Config::load_from_path(temp_file.path()).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        std::env::set_var("ENGAGEMENT_QUOTA_MAX_LIKES", "6");
        std::env::set_var("ENGAGEMENT_QUOTA_MAX_CONSUMERS", "not-a-number");
        std::env::set_var("ENGAGEMENT_QUOTA_LOG_FORMAT", "pretty");

        let config = Config::default().apply_env_overrides();
        assert_eq!(config.quota.max_likes, 6);
        assert_eq!(config.quota.max_consumers, 3);
        assert_eq!(config.logging.format, "pretty");

        clear_env();
    }

    #[test]
    fn test_log_level_parsing() {
        let mut config = Config::default();
        config.logging.level = "DEBUG".to_string();
        assert_eq!(config.log_level().unwrap(), tracing::Level::DEBUG);

        config.logging.level = "warn".to_string();
        assert_eq!(config.log_level().unwrap(), tracing::Level::WARN);
    }
}
