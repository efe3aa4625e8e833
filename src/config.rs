use crate::error::{Error, Result};
use crate::output::SortOrder;
use crate::resolver::ChildFailurePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const VALID_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
const MAX_CONCURRENCY_LIMIT: usize = 1024;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            fetch: FetchConfig::default(),
            cache: CacheConfig::default(),
            output: OutputConfig::default(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default)]
    pub on_child_error: ChildFailurePolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            on_child_error: ChildFailurePolicy::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    /// Defaults to the per-user cache directory when unset
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    /// File path; unset means stdout
    pub destination: Option<String>,
    #[serde(default)]
    pub pretty: bool,
    #[serde(default)]
    pub sort: SortOrder,
}

fn default_base_url() -> String {
    "https://hacker-news.firebaseio.com".to_string()
}

fn default_user_agent() -> String {
    concat!("hn-comments/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrency() -> usize {
    64
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read config file {}: {}", path.display(), e))
        })?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::Config(format!("failed to parse TOML configuration: {}", e)))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            return Err(Error::Config("api.base_url cannot be empty".to_string()));
        }

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "api.base_url must be an http(s) URL, got: {}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(Error::Config("api.timeout_secs must be positive".to_string()));
        }

        if self.fetch.max_concurrency == 0 || self.fetch.max_concurrency > MAX_CONCURRENCY_LIMIT {
            return Err(Error::Config(format!(
                "fetch.max_concurrency must be between 1 and {}",
                MAX_CONCURRENCY_LIMIT
            )));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(Error::Config(format!(
                "invalid log level: {}. Must be one of: {:?}",
                self.log_level, VALID_LOG_LEVELS
            )));
        }

        // Output directory must already exist; only the file itself is created
        if let Some(destination) = &self.output.destination {
            let path = Path::new(destination);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(Error::Config(format!(
                        "output directory does not exist: {}",
                        parent.display()
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let toml = r#"
            log_level = "debug"

            [api]
            base_url = "https://hacker-news.firebaseio.com"
            timeout_secs = 10

            [fetch]
            max_concurrency = 16
            on_child_error = "skip"

            [cache]
            dir = "/tmp/hn-cache"

            [output]
            pretty = true
            sort = "none"
        "#;

        let config = Config::from_toml(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.fetch.max_concurrency, 16);
        assert_eq!(config.fetch.on_child_error, ChildFailurePolicy::Skip);
        assert_eq!(config.cache.dir, Some(PathBuf::from("/tmp/hn-cache")));
        assert_eq!(config.output.sort, SortOrder::None);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.api.base_url, "https://hacker-news.firebaseio.com");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.fetch.max_concurrency, 64);
        assert_eq!(config.fetch.on_child_error, ChildFailurePolicy::Abort);
        assert_eq!(config.output.sort, SortOrder::Id);
        assert_eq!(config.log_level, "info");
        assert!(config.cache.dir.is_none());
        assert!(config.output.destination.is_none());
    }

    #[test]
    fn test_zero_concurrency() {
        let toml = r#"
            [fetch]
            max_concurrency = 0
        "#;

        let config = Config::from_toml(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let config = Config::from_toml(r#"log_level = "verbose""#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_child_error_policy() {
        let toml = r#"
            [fetch]
            on_child_error = "retry"
        "#;

        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn test_missing_output_directory() {
        let mut config = Config::default();
        config.output.destination = Some("/definitely/not/here/out.json".to_string());

        assert!(config.validate().is_err());
    }
}
