//! Application configuration structures.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Consumer loop behavior
    #[serde(default)]
    pub consumer: ConsumerConfig,

    /// Local delivery spool
    #[serde(default)]
    pub queue: QueueConfig,

    /// Analysis document store
    #[serde(default)]
    pub store: StoreConfig,

    /// Search index
    #[serde(default)]
    pub index: IndexConfig,

    /// Analysis service endpoint
    #[serde(default = "defaults::analyzer")]
    pub analyzer: ServiceConfig,

    /// Scoring service endpoint
    #[serde(default = "defaults::scorer")]
    pub scorer: ServiceConfig,

    /// Module name to blacklist reason
    #[serde(default)]
    pub blacklist: HashMap<String, String>,

    /// GitHub credential pool
    #[serde(default)]
    pub github: GithubConfig,

    /// Module name to git ref override
    #[serde(default)]
    pub refs: HashMap<String, String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, using defaults only when the file is missing.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("Config file {:?} not found. Using defaults.", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.consumer.concurrency == 0 {
            return Err(AppError::validation("consumer.concurrency must be > 0"));
        }
        if self.queue.max_attempts == 0 {
            return Err(AppError::validation("queue.max_attempts must be > 0"));
        }
        if self.queue.spool_dir.as_os_str().is_empty() {
            return Err(AppError::validation("queue.spool_dir is empty"));
        }
        if self.store.database.trim().is_empty() {
            return Err(AppError::validation("store.database is empty"));
        }
        if self.index.index.trim().is_empty() {
            return Err(AppError::validation("index.index is empty"));
        }

        Self::validate_url("store.url", &self.store.url)?;
        Self::validate_url("index.url", &self.index.url)?;
        self.analyzer.validate("analyzer")?;
        self.scorer.validate("scorer")?;

        if let Some((name, _)) = self
            .blacklist
            .iter()
            .find(|(_, reason)| reason.trim().is_empty())
        {
            return Err(AppError::validation(format!(
                "blacklist entry for {name} has no reason"
            )));
        }
        Ok(())
    }

    fn validate_url(field: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(AppError::validation(format!("{field} is empty")));
        }
        Url::parse(value)
            .map(|_| ())
            .map_err(|e| AppError::validation(format!("{field} is not a valid URL: {e}")))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            consumer: ConsumerConfig::default(),
            queue: QueueConfig::default(),
            store: StoreConfig::default(),
            index: IndexConfig::default(),
            analyzer: defaults::analyzer(),
            scorer: defaults::scorer(),
            blacklist: HashMap::new(),
            github: GithubConfig::default(),
            refs: HashMap::new(),
        }
    }
}

/// Consumer loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Maximum deliveries processed at once
    #[serde(default = "defaults::concurrency")]
    pub concurrency: usize,

    /// Idle wait when the queue has nothing available
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_ms: u64,

    /// Ask the analysis service to wait out rate limits instead of failing
    #[serde(default = "defaults::wait_rate_limit")]
    pub wait_rate_limit: bool,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            concurrency: defaults::concurrency(),
            poll_interval_ms: defaults::poll_interval(),
            wait_rate_limit: defaults::wait_rate_limit(),
        }
    }
}

/// Filesystem spool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "defaults::spool_dir")]
    pub spool_dir: PathBuf,

    /// Rejections before a delivery is dead-lettered
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Delay before a rejected delivery becomes visible again
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            spool_dir: defaults::spool_dir(),
            max_attempts: defaults::max_attempts(),
            retry_delay_secs: defaults::retry_delay(),
        }
    }
}

/// Document store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "defaults::store_url")]
    pub url: String,

    #[serde(default = "defaults::database")]
    pub database: String,

    #[serde(default = "defaults::store_timeout")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: defaults::store_url(),
            database: defaults::database(),
            timeout_secs: defaults::store_timeout(),
        }
    }
}

/// Search index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "defaults::index_url")]
    pub url: String,

    #[serde(default = "defaults::index_name")]
    pub index: String,

    #[serde(default = "defaults::store_timeout")]
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: defaults::index_url(),
            index: defaults::index_name(),
            timeout_secs: defaults::store_timeout(),
        }
    }
}

/// An HTTP service endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::service_timeout")]
    pub timeout_secs: u64,
}

impl ServiceConfig {
    fn validate(&self, section: &str) -> Result<()> {
        Config::validate_url(&format!("{section}.url"), &self.url)?;
        if self.timeout_secs == 0 {
            return Err(AppError::validation(format!(
                "{section}.timeout_secs must be > 0"
            )));
        }
        Ok(())
    }
}

/// GitHub credentials handed to the analysis service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default)]
    pub tokens: Vec<String>,
}

mod defaults {
    use std::path::PathBuf;

    use super::ServiceConfig;

    // Consumer defaults
    pub fn concurrency() -> usize {
        5
    }
    pub fn poll_interval() -> u64 {
        1000
    }
    pub fn wait_rate_limit() -> bool {
        true
    }

    // Queue defaults
    pub fn spool_dir() -> PathBuf {
        PathBuf::from("spool")
    }
    pub fn max_attempts() -> u32 {
        5
    }
    pub fn retry_delay() -> u64 {
        30
    }

    // Store and index defaults
    pub fn store_url() -> String {
        "http://127.0.0.1:5984".into()
    }
    pub fn database() -> String {
        "npms".into()
    }
    pub fn index_url() -> String {
        "http://127.0.0.1:9200".into()
    }
    pub fn index_name() -> String {
        "npms-current".into()
    }
    pub fn store_timeout() -> u64 {
        10
    }

    // Service defaults
    pub fn service_timeout() -> u64 {
        30
    }
    pub fn analyzer() -> ServiceConfig {
        ServiceConfig {
            url: "http://127.0.0.1:7100".into(),
            timeout_secs: 600,
        }
    }
    pub fn scorer() -> ServiceConfig {
        ServiceConfig {
            url: "http://127.0.0.1:7200".into(),
            timeout_secs: service_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn default_concurrency_is_five() {
        assert_eq!(Config::default().consumer.concurrency, 5);
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.consumer.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_service_url() {
        let mut config = Config::default();
        config.analyzer.url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_blacklist_reason() {
        let mut config = Config::default();
        config
            .blacklist
            .insert("some-package".to_string(), " ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
            [consumer]
            concurrency = 8

            [queue]
            spool_dir = "/var/spool/reanalyzer"

            [analyzer]
            url = "http://analyzer:7100"

            [blacklist]
            "hooka-tools" = "Package is too big"

            [github]
            tokens = ["a", "b"]

            [refs]
            "some-module" = "develop"
        "#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.consumer.concurrency, 8);
        assert_eq!(config.consumer.poll_interval_ms, 1000);
        assert!(config.consumer.wait_rate_limit);
        assert_eq!(config.queue.max_attempts, 5);
        assert_eq!(config.analyzer.url, "http://analyzer:7100");
        assert_eq!(config.analyzer.timeout_secs, 30);
        assert_eq!(config.scorer.url, "http://127.0.0.1:7200");
        assert_eq!(config.blacklist["hooka-tools"], "Package is too big");
        assert_eq!(config.github.tokens.len(), 2);
        assert_eq!(config.refs["some-module"], "develop");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_or_default_falls_back_only_when_missing() {
        let tmp = tempfile::TempDir::new().unwrap();

        let missing = tmp.path().join("absent.toml");
        let config = Config::load_or_default(&missing).unwrap();
        assert_eq!(config.consumer.concurrency, 5);

        let broken = tmp.path().join("broken.toml");
        fs::write(&broken, "[blacklist\n\"hooka-tools\" = \"Package is too big\"").unwrap();
        assert!(matches!(
            Config::load_or_default(&broken),
            Err(AppError::Toml(_))
        ));

        let valid = tmp.path().join("valid.toml");
        fs::write(&valid, "[blacklist]\n\"hooka-tools\" = \"Package is too big\"\n").unwrap();
        let config = Config::load_or_default(&valid).unwrap();
        assert_eq!(config.blacklist.len(), 1);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.analyzer.timeout_secs, 600);
        assert!(config.blacklist.is_empty());
    }
}
