//! Configuration loading for the mediafeed CLI.
//!
//! All fields are required. No defaults.

use mediafeed_core::{HasMorePolicy, Section};
use mediafeed_sync::SyncConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest page the feed server accepts.
pub const MAX_PAGE_SIZE: usize = 100;

pub const CONFIG_ENV_VAR: &str = "MEDIAFEED_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub page_size: usize,
    pub refresh_interval_ms: u64,
    pub initial_section: String,
    pub has_more_policy: HasMorePolicy,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub filter: String,
    pub json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or MEDIAFEED_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl FeedConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args(std::env::args().skip(1)).or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: FeedConfig = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "page_size",
                reason: format!("must be between 1 and {}", MAX_PAGE_SIZE),
            });
        }
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "refresh_interval_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.initial_section.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "initial_section",
                reason: "must not be empty".to_string(),
            });
        }
        if self.log.filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log.filter",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn to_sync_config(&self) -> SyncConfig {
        SyncConfig::new()
            .with_page_size(self.page_size)
            .with_refresh_interval(Duration::from_millis(self.refresh_interval_ms))
            .with_initial_section(Section::new(self.initial_section.trim()))
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from)
}

fn config_path_from_args<I>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID: &str = r#"
api_base_url = "http://localhost:8000/"
request_timeout_ms = 5000
page_size = 20
refresh_interval_ms = 300000
initial_section = "all"
has_more_policy = "server_flag"

[log]
filter = "mediafeed=info"
json = false
"#;

    fn valid() -> FeedConfig {
        FeedConfig::from_toml(VALID).unwrap()
    }

    #[test]
    fn test_from_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VALID.as_bytes()).unwrap();

        let config = FeedConfig::from_path(file.path()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.has_more_policy, HasMorePolicy::ServerFlag);
        assert!(!config.log.json);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FeedConfig::from_path(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = VALID.replace("[log]", "theme = \"dark\"\n\n[log]");
        let err = FeedConfig::from_toml(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_field_rejected() {
        let toml = VALID.replace("page_size = 20\n", "");
        assert!(matches!(
            FeedConfig::from_toml(&toml).unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn test_short_page_policy_parses() {
        let toml = VALID.replace("server_flag", "short_page");
        let config = FeedConfig::from_toml(&toml).unwrap();
        assert_eq!(config.has_more_policy, HasMorePolicy::ShortPage);
    }

    #[test]
    fn test_validate_page_size_bounds() {
        let mut config = valid();
        config.page_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "page_size", .. })
        ));

        config.page_size = MAX_PAGE_SIZE + 1;
        assert!(config.validate().is_err());

        config.page_size = MAX_PAGE_SIZE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_values() {
        let mut config = valid();
        config.api_base_url = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "api_base_url", .. })
        ));

        let mut config = valid();
        config.initial_section = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "initial_section", .. })
        ));

        let mut config = valid();
        config.log.filter = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "log.filter", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_durations() {
        let mut config = valid();
        config.request_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.refresh_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "refresh_interval_ms", .. })
        ));
    }

    #[test]
    fn test_to_sync_config() {
        let mut config = valid();
        config.initial_section = "history".to_string();
        let sync = config.to_sync_config();

        assert_eq!(sync.page_size, 20);
        assert_eq!(sync.refresh_interval, Duration::from_secs(300));
        assert_eq!(sync.initial_section, Section::new("history"));
    }

    #[test]
    fn test_config_flag_parsing() {
        let args = ["--verbose", "--config", "feed.toml"].map(String::from);
        assert_eq!(config_path_from_args(args), Some(PathBuf::from("feed.toml")));

        let args = ["--config"].map(String::from);
        assert_eq!(config_path_from_args(args), None);
    }
}
